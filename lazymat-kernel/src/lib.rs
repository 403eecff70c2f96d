//! Kernel selection and numerical kernels for lazymat.
//!
//! Every kernel entry point in [`dispatch`] first describes its operands with
//! [`OperandInfo`], asks [`select_strategy`] for one of the three strategies
//! and then runs it:
//!
//! - [`Strategy::Scalar`]: accessor-based loops ([`naive`], [`sparse`]) that
//!   read through structural forms and lazy element operations
//! - [`Strategy::Blocked`]: chunked element-wise loops and packed, tiled
//!   matrix products ([`blocked`]), SIMD-accelerated with the `simd` feature
//!   and fanned out with rayon under `parallel`
//! - [`Strategy::External`]: CBLAS (`blas`) or faer (`faer`) GEMM
//!
//! # Features
//!
//! - `parallel` (default): rayon fan-out of blocked kernels
//! - `simd`: pulp-dispatched sum and dot products for `f32`/`f64`
//! - `blas`: CBLAS `?gemm` via `cblas-sys`
//! - `faer`: faer matmul for `f32`/`f64`

#[cfg(all(feature = "faer", feature = "blas"))]
compile_error!("Features `faer` and `blas` are mutually exclusive. Use one or the other.");

pub mod backend;
pub mod blocked;
pub mod config;
pub mod dispatch;
pub mod maybe_sync;
pub mod naive;
pub mod select;
pub mod simd;
pub mod sparse;
mod threading;

#[cfg(all(feature = "blas", not(feature = "faer")))]
mod gemm_blas;
#[cfg(feature = "faer")]
mod gemm_faer;

pub use backend::{external_available, ActiveBackend, ExternalGemm};
pub use config::EvalConfig;
pub use dispatch::{dot, gemm, hadamard, scaled_copy, sparse_accumulate, sum};
pub use lazymat_storage::{LinalgError, Result};
pub use maybe_sync::MaybeSync;
pub use select::{select_strategy, KernelOp, OperandInfo, Strategy};
pub use simd::MaybeSimdOps;

use lazymat_storage::{MatrixRef, Scalar, SparseRef};
use num_complex::{Complex32, Complex64};

/// How a kernel result is combined with the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `dest = value`
    Set,
    /// `dest += value`
    Add,
    /// `dest -= value`
    Sub,
}

impl Mode {
    #[inline(always)]
    pub fn combine<T: Scalar>(self, dest: T, value: T) -> T {
        match self {
            Mode::Set => value,
            Mode::Add => dest + value,
            Mode::Sub => dest - value,
        }
    }

    /// Mode for every term after the first of a sum: `Set` becomes `Add`.
    pub fn then(self) -> Self {
        match self {
            Mode::Set => Mode::Add,
            other => other,
        }
    }

    /// `(alpha, beta)` of `dest = alpha * value + beta * dest` for a unit value scale.
    pub fn alpha_beta<T: Scalar>(self, alpha: T) -> (T, T) {
        match self {
            Mode::Set => (alpha, T::zero()),
            Mode::Add => (alpha, T::one()),
            Mode::Sub => (-alpha, T::one()),
        }
    }
}

/// Element types every kernel strategy accepts.
///
/// `f32`, `f64`, `i32`, `i64`, `Complex32` and `Complex64` implement it out of
/// the box. Other [`Scalar`] types opt in with empty [`MaybeSimdOps`] and
/// [`ExternalGemm`] impls.
pub trait KernelScalar: Scalar + MaybeSimdOps + ExternalGemm {}

impl<T: Scalar + MaybeSimdOps + ExternalGemm> KernelScalar for T {}

#[allow(dead_code)]
fn assert_kernel_scalars() {
    fn check<T: KernelScalar>() {}
    check::<f32>();
    check::<f64>();
    check::<i32>();
    check::<i64>();
    check::<Complex32>();
    check::<Complex64>();
}

/// A matrix product operand: dense view or sparse view.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a, T> {
    Dense(MatrixRef<'a, T>),
    Sparse(SparseRef<'a, T>),
}

impl<'a, T: Scalar> Operand<'a, T> {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Operand::Dense(v) => v.shape(),
            Operand::Sparse(s) => s.shape(),
        }
    }

    pub fn info(&self) -> OperandInfo {
        match self {
            Operand::Dense(v) => OperandInfo::of_view(v),
            Operand::Sparse(s) => OperandInfo::of_sparse(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_combine() {
        assert_eq!(Mode::Set.combine(5.0, 2.0), 2.0);
        assert_eq!(Mode::Add.combine(5.0, 2.0), 7.0);
        assert_eq!(Mode::Sub.combine(5.0, 2.0), 3.0);
    }

    #[test]
    fn test_mode_then_and_alpha_beta() {
        assert_eq!(Mode::Set.then(), Mode::Add);
        assert_eq!(Mode::Sub.then(), Mode::Sub);
        assert_eq!(Mode::Sub.alpha_beta(2.0), (-2.0, 1.0));
        assert_eq!(Mode::Set.alpha_beta(3i64), (3, 0));
    }
}
