//! Sparse-aware kernels.
//!
//! Only stored entries are visited. Products with a sparse factor scatter
//! `alpha * a[i][p] * b[p][j]` into a dense destination, so work is
//! proportional to the stored entries times the dense extent.

use lazymat_storage::{MatrixMut, MatrixRef, Scalar, SparseRef};

use crate::{Mode, Operand};

/// `dest[i][j] += value`.
#[inline]
fn scatter<T: Scalar>(dest: &mut MatrixMut<'_, T>, i: usize, j: usize, value: T) {
    unsafe {
        let d = dest.get_unchecked(i, j);
        dest.set_unchecked(i, j, d + value);
    }
}

/// Fold `mode` into a signed scale and clear the destination for `Set`.
fn prepare<T: Scalar>(dest: &mut MatrixMut<'_, T>, alpha: T, mode: Mode) -> T {
    match mode {
        Mode::Set => {
            dest.fill(T::zero());
            alpha
        }
        Mode::Add => alpha,
        Mode::Sub => -alpha,
    }
}

/// `dest op= alpha * src` for a sparse source.
pub fn accumulate<T: Scalar>(dest: &mut MatrixMut<'_, T>, alpha: T, src: &SparseRef<'_, T>, mode: Mode) {
    debug_assert_eq!(dest.shape(), src.shape());
    let scale = prepare(dest, alpha, mode);
    src.for_each(|i, j, v| scatter(dest, i, j, scale * v));
}

/// `dest op= alpha * a * b` where at least one factor is sparse.
pub fn gemm<T: Scalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &Operand<'_, T>,
    b: &Operand<'_, T>,
    mode: Mode,
) {
    let scale = prepare(dest, alpha, mode);
    match (a, b) {
        (Operand::Sparse(a), Operand::Dense(b)) => sparse_dense(dest, scale, a, b),
        (Operand::Dense(a), Operand::Sparse(b)) => dense_sparse(dest, scale, a, b),
        (Operand::Sparse(a), Operand::Sparse(b)) => sparse_sparse(dest, scale, a, b),
        (Operand::Dense(a), Operand::Dense(b)) => {
            crate::naive::gemm(dest, scale, a, b, Mode::Add);
        }
    }
}

fn sparse_dense<T: Scalar>(dest: &mut MatrixMut<'_, T>, scale: T, a: &SparseRef<'_, T>, b: &MatrixRef<'_, T>) {
    let n = b.cols();
    a.for_each(|i, p, v| {
        let v = scale * v;
        for j in 0..n {
            scatter(dest, i, j, v * unsafe { b.get_unchecked(p, j) });
        }
    });
}

fn dense_sparse<T: Scalar>(dest: &mut MatrixMut<'_, T>, scale: T, a: &MatrixRef<'_, T>, b: &SparseRef<'_, T>) {
    let m = a.rows();
    b.for_each(|p, j, v| {
        let v = scale * v;
        for i in 0..m {
            scatter(dest, i, j, unsafe { a.get_unchecked(i, p) } * v);
        }
    });
}

fn sparse_sparse<T: Scalar>(dest: &mut MatrixMut<'_, T>, scale: T, a: &SparseRef<'_, T>, b: &SparseRef<'_, T>) {
    a.for_each(|i, p, av| {
        let av = scale * av;
        if let Ok(row) = b.row(p) {
            row.for_each(|_, j, bv| scatter(dest, i, j, av * bv));
        }
    });
}
