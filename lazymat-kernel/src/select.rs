//! Strategy selection.
//!
//! [`select_strategy`] is the single place that maps an operation and its
//! operand descriptors onto a kernel. It is pure: no allocation, no logging,
//! no global state.

use lazymat_storage::{Descriptor, Layout, MatrixMut, MatrixRef, Scalar, SparseRef};

use crate::config::EvalConfig;

/// Kernel family being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelOp {
    /// `dest op= alpha * src`
    ScaledCopy,
    /// `dest op= a .* b`
    Hadamard,
    /// `dest op= alpha * a * b` with `a: m x k`, `b: k x n`
    Gemm { m: usize, n: usize, k: usize },
}

/// What the selector needs to know about one operand or the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandInfo {
    pub shape: (usize, usize),
    pub descriptor: Descriptor,
    /// A lazy conjugation is pending on reads.
    pub conjugated: bool,
    /// Layout with a unit-stride fast dimension.
    pub unit_stride: Option<Layout>,
    /// Layout under which the elements form one gap-free run.
    pub contiguous: Option<Layout>,
}

impl OperandInfo {
    pub fn of_view<T: Scalar>(v: &MatrixRef<'_, T>) -> Self {
        Self {
            shape: v.shape(),
            descriptor: v.descriptor(),
            conjugated: !v.op().is_identity(),
            unit_stride: v.unit_stride_layout(),
            contiguous: v.contiguous_layout(),
        }
    }

    pub fn of_dest<T>(v: &MatrixMut<'_, T>) -> Self {
        Self {
            shape: v.shape(),
            descriptor: v.descriptor(),
            conjugated: false,
            unit_stride: v.unit_stride_layout(),
            contiguous: v.contiguous_layout(),
        }
    }

    pub fn of_sparse<T: Scalar>(s: &SparseRef<'_, T>) -> Self {
        Self {
            shape: s.shape(),
            descriptor: s.descriptor(),
            conjugated: !s.op().is_identity(),
            unit_stride: None,
            contiguous: None,
        }
    }

    /// Dense, general and read without a pending element operation.
    pub fn is_plain_dense(&self) -> bool {
        !self.descriptor.is_sparse() && !self.descriptor.is_structured() && !self.conjugated
    }

    fn is_vector(&self) -> bool {
        self.shape.0 <= 1 || self.shape.1 <= 1
    }
}

/// Kernel family chosen for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Accessor-based loop; handles every descriptor.
    Scalar,
    /// Chunked element-wise loop or packed, tiled matrix product.
    Blocked,
    /// External GEMM backend.
    External,
}

/// Choose the kernel for one invocation.
///
/// `external_available` reports whether an external backend is compiled in
/// (see [`external_available`](crate::external_available)); the backend may
/// still refuse a particular element type at run time, in which case the
/// caller falls back to [`Strategy::Blocked`].
pub fn select_strategy(
    op: KernelOp,
    dest: &OperandInfo,
    operands: &[OperandInfo],
    cfg: &EvalConfig,
    external_available: bool,
) -> Strategy {
    let all_plain = dest.is_plain_dense() && operands.iter().all(OperandInfo::is_plain_dense);
    if !all_plain {
        return Strategy::Scalar;
    }
    match op {
        KernelOp::ScaledCopy | KernelOp::Hadamard => {
            let len = dest.shape.0.saturating_mul(dest.shape.1);
            if len < cfg.vectorize_threshold.max(1) {
                return Strategy::Scalar;
            }
            // Linear element order must agree across all buffers.
            let same_order = dest.contiguous.is_some()
                && operands.iter().all(|o| {
                    o.contiguous.is_some() && (o.contiguous == dest.contiguous || dest.is_vector())
                });
            if same_order {
                Strategy::Blocked
            } else {
                Strategy::Scalar
            }
        }
        KernelOp::Gemm { m, n, k } => {
            let work = m.saturating_mul(n).saturating_mul(k);
            let blas_compatible = dest.unit_stride.is_some()
                && operands.iter().all(|o| o.unit_stride.is_some());
            if cfg.external
                && external_available
                && blas_compatible
                && work >= cfg.external_threshold
            {
                Strategy::External
            } else if work >= cfg.vectorize_threshold.max(1) {
                Strategy::Blocked
            } else {
                Strategy::Scalar
            }
        }
    }
}
