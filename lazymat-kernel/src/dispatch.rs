//! Kernel entry points.
//!
//! Each function checks shapes, describes its operands, asks
//! [`select_strategy`] for a kernel and runs it. The strategy that actually
//! ran is returned so callers can log or test it.

use lazymat_storage::{Layout, LinalgError, MatrixMut, MatrixRef, Result, SparseRef};

use crate::backend::external_available;
use crate::config::EvalConfig;
use crate::select::{select_strategy, KernelOp, OperandInfo, Strategy};
use crate::simd::{slice_dot, slice_sum};
use crate::{blocked, naive, sparse, KernelScalar, Mode, Operand};

fn check_same_shape(a: (usize, usize), b: (usize, usize)) -> Result<()> {
    if a == b {
        Ok(())
    } else {
        Err(LinalgError::ShapeMismatch(a, b))
    }
}

/// `dest op= alpha * src`.
pub fn scaled_copy<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    src: &MatrixRef<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<Strategy> {
    check_same_shape(dest.shape(), src.shape())?;
    let strategy = select_strategy(
        KernelOp::ScaledCopy,
        &OperandInfo::of_dest(dest),
        &[OperandInfo::of_view(src)],
        cfg,
        external_available(),
    );
    tracing::trace!(?strategy, ?mode, shape = ?dest.shape(), "scaled copy");
    match strategy {
        Strategy::Scalar => naive::scaled_copy(dest, alpha, src, mode),
        Strategy::Blocked | Strategy::External => blocked::scaled_copy(dest, alpha, src, mode, cfg),
    }
    Ok(strategy)
}

/// `dest op= alpha * (a .* b)`.
pub fn hadamard<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<Strategy> {
    check_same_shape(a.shape(), b.shape())?;
    check_same_shape(dest.shape(), a.shape())?;
    let strategy = select_strategy(
        KernelOp::Hadamard,
        &OperandInfo::of_dest(dest),
        &[OperandInfo::of_view(a), OperandInfo::of_view(b)],
        cfg,
        external_available(),
    );
    tracing::trace!(?strategy, ?mode, shape = ?dest.shape(), "hadamard");
    match strategy {
        Strategy::Scalar => naive::hadamard(dest, alpha, a, b, mode),
        Strategy::Blocked | Strategy::External => blocked::hadamard(dest, alpha, a, b, mode, cfg),
    }
    Ok(strategy)
}

/// `dest op= alpha * a * b`.
///
/// The destination must not share memory with `a` or `b`. An external
/// backend that refuses the call is replaced by the blocked product, which is
/// then the reported strategy.
pub fn gemm<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &Operand<'_, T>,
    b: &Operand<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<Strategy> {
    let (m, k) = a.shape();
    let (kb, n) = b.shape();
    if k != kb {
        return Err(LinalgError::ShapeMismatch(a.shape(), b.shape()));
    }
    check_same_shape(dest.shape(), (m, n))?;

    let (a, b) = match (a, b) {
        (Operand::Dense(a), Operand::Dense(b)) => (a, b),
        _ => {
            tracing::trace!(m, n, k, ?mode, "sparse gemm");
            sparse::gemm(dest, alpha, a, b, mode);
            return Ok(Strategy::Scalar);
        }
    };

    let strategy = select_strategy(
        KernelOp::Gemm { m, n, k },
        &OperandInfo::of_dest(dest),
        &[OperandInfo::of_view(a), OperandInfo::of_view(b)],
        cfg,
        external_available(),
    );
    tracing::trace!(?strategy, m, n, k, ?mode, "gemm");
    match strategy {
        Strategy::External => {
            let (alpha_ext, beta) = mode.alpha_beta(alpha);
            if T::external_gemm(dest, alpha_ext, a, b, beta) {
                return Ok(Strategy::External);
            }
            tracing::debug!(
                backend = crate::backend::backend_name(),
                ty = std::any::type_name::<T>(),
                "external gemm refused, using blocked kernel"
            );
            blocked::gemm(dest, alpha, a, b, mode, cfg)?;
            Ok(Strategy::Blocked)
        }
        Strategy::Blocked => {
            blocked::gemm(dest, alpha, a, b, mode, cfg)?;
            Ok(Strategy::Blocked)
        }
        Strategy::Scalar => {
            naive::gemm(dest, alpha, a, b, mode);
            Ok(Strategy::Scalar)
        }
    }
}

/// `dest op= alpha * src` for a sparse source; only stored entries are read.
pub fn sparse_accumulate<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    src: &SparseRef<'_, T>,
    mode: Mode,
    _cfg: &EvalConfig,
) -> Result<Strategy> {
    check_same_shape(dest.shape(), src.shape())?;
    tracing::trace!(?mode, shape = ?dest.shape(), nnz = src.nnz(), "sparse accumulate");
    sparse::accumulate(dest, alpha, src, mode);
    Ok(Strategy::Scalar)
}

/// One gap-free slice holding the elements of a plain view.
fn plain_slice<'a, T>(v: &MatrixRef<'a, T>) -> Option<(&'a [T], Layout)> {
    if !v.is_plain() {
        return None;
    }
    let layout = v.contiguous_layout()?;
    Some((v.as_slice(layout)?, layout))
}

/// Sum of all logical elements.
pub fn sum<T: KernelScalar>(src: &MatrixRef<'_, T>, cfg: &EvalConfig) -> T {
    let len = src.rows() * src.cols();
    if len >= cfg.vectorize_threshold.max(1) {
        if let Some((data, _)) = plain_slice(src) {
            return slice_sum(data);
        }
    }
    naive::sum(src)
}

/// `sum(a[i][j] * b[i][j])`; no conjugation is applied.
pub fn dot<T: KernelScalar>(a: &MatrixRef<'_, T>, b: &MatrixRef<'_, T>, cfg: &EvalConfig) -> Result<T> {
    check_same_shape(a.shape(), b.shape())?;
    let len = a.rows() * a.cols();
    if len >= cfg.vectorize_threshold.max(1) {
        if let (Some((x, lx)), Some((y, ly))) = (plain_slice(a), plain_slice(b)) {
            if lx == ly || a.rows() <= 1 || a.cols() <= 1 {
                return Ok(slice_dot(x, y));
            }
        }
    }
    Ok(naive::dot(a, b))
}
