//! CBLAS-backed matrix product.
//!
//! All calls use `CblasColMajor`. A destination with unit column stride
//! (row-major) is handled by computing the transposed product
//! `C^T = B^T A^T`, which is column-major.

use cblas_sys::{CBLAS_LAYOUT, CBLAS_TRANSPOSE};
use lazymat_storage::{MatrixMut, MatrixRef, Scalar};
use num_complex::{Complex32, Complex64};

use crate::backend::ExternalGemm;

/// Type-level dispatch onto `cblas_?gemm`.
trait BlasGemm: Scalar {
    /// # Safety
    /// Pointers must address matrices of the given sizes and leading
    /// dimensions in column-major order.
    unsafe fn gemm(
        trans_a: CBLAS_TRANSPOSE,
        trans_b: CBLAS_TRANSPOSE,
        m: i32,
        n: i32,
        k: i32,
        alpha: Self,
        a: *const Self,
        lda: i32,
        b: *const Self,
        ldb: i32,
        beta: Self,
        c: *mut Self,
        ldc: i32,
    );
}

macro_rules! impl_blas_real {
    ($t:ty, $f:ident) => {
        impl BlasGemm for $t {
            unsafe fn gemm(
                trans_a: CBLAS_TRANSPOSE,
                trans_b: CBLAS_TRANSPOSE,
                m: i32,
                n: i32,
                k: i32,
                alpha: $t,
                a: *const $t,
                lda: i32,
                b: *const $t,
                ldb: i32,
                beta: $t,
                c: *mut $t,
                ldc: i32,
            ) {
                cblas_sys::$f(
                    CBLAS_LAYOUT::CblasColMajor,
                    trans_a,
                    trans_b,
                    m,
                    n,
                    k,
                    alpha,
                    a,
                    lda,
                    b,
                    ldb,
                    beta,
                    c,
                    ldc,
                );
            }
        }
    };
}

macro_rules! impl_blas_complex {
    ($t:ty, $f:ident) => {
        impl BlasGemm for $t {
            unsafe fn gemm(
                trans_a: CBLAS_TRANSPOSE,
                trans_b: CBLAS_TRANSPOSE,
                m: i32,
                n: i32,
                k: i32,
                alpha: $t,
                a: *const $t,
                lda: i32,
                b: *const $t,
                ldb: i32,
                beta: $t,
                c: *mut $t,
                ldc: i32,
            ) {
                cblas_sys::$f(
                    CBLAS_LAYOUT::CblasColMajor,
                    trans_a,
                    trans_b,
                    m,
                    n,
                    k,
                    (&alpha) as *const _ as *const _,
                    a as *const _,
                    lda,
                    b as *const _,
                    ldb,
                    (&beta) as *const _ as *const _,
                    c as *mut _,
                    ldc,
                );
            }
        }
    };
}

impl_blas_real!(f32, cblas_sgemm);
impl_blas_real!(f64, cblas_dgemm);
impl_blas_complex!(Complex32, cblas_cgemm);
impl_blas_complex!(Complex64, cblas_zgemm);

/// Transpose flag and leading dimension of an `nrows x ncols` operand.
///
/// `None` when neither stride is unit. A stride of an extent-1 dimension is
/// never used for addressing, so the leading dimension is clamped to what
/// CBLAS validates.
fn operand_layout(
    row_stride: isize,
    col_stride: isize,
    nrows: usize,
    ncols: usize,
) -> Option<(CBLAS_TRANSPOSE, i32)> {
    let ld = |stride: isize, extent: usize| i32::try_from(stride.max(extent as isize).max(1)).ok();
    if row_stride == 1 || nrows <= 1 && col_stride != 1 {
        Some((CBLAS_TRANSPOSE::CblasNoTrans, ld(col_stride, nrows)?))
    } else if col_stride == 1 || ncols <= 1 {
        Some((CBLAS_TRANSPOSE::CblasTrans, ld(row_stride, ncols)?))
    } else {
        None
    }
}

fn blas_gemm<T: BlasGemm>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    beta: T,
) -> bool {
    if !a.is_plain() || !b.is_plain() {
        return false;
    }
    let (m, k) = a.shape();
    let n = b.cols();
    if m == 0 || n == 0 {
        return true;
    }
    let col_major_dest = dest.row_stride() == 1 || m <= 1 && dest.col_stride() != 1;
    if !col_major_dest {
        if dest.col_stride() == 1 || n <= 1 {
            let mut dt = dest.rb_mut().transpose();
            return blas_gemm(&mut dt, alpha, &b.transpose(), &a.transpose(), beta);
        }
        return false;
    }
    let Some(ldc) = i32::try_from(dest.col_stride().max(m as isize).max(1)).ok() else {
        return false;
    };
    let (Some((ta, lda)), Some((tb, ldb))) = (
        operand_layout(a.row_stride(), a.col_stride(), m, k),
        operand_layout(b.row_stride(), b.col_stride(), k, n),
    ) else {
        return false;
    };
    let (Ok(mi), Ok(ni), Ok(ki)) = (i32::try_from(m), i32::try_from(n), i32::try_from(k)) else {
        return false;
    };
    tracing::trace!(m, n, k, "cblas gemm");
    unsafe {
        T::gemm(
            ta,
            tb,
            mi,
            ni,
            ki,
            alpha,
            a.as_ptr(),
            lda,
            b.as_ptr(),
            ldb,
            beta,
            dest.as_mut_ptr(),
            ldc,
        );
    }
    true
}

macro_rules! impl_external_blas {
    ($($t:ty),*) => {
        $(impl ExternalGemm for $t {
            fn external_gemm(
                dest: &mut MatrixMut<'_, $t>,
                alpha: $t,
                a: &MatrixRef<'_, $t>,
                b: &MatrixRef<'_, $t>,
                beta: $t,
            ) -> bool {
                blas_gemm(dest, alpha, a, b, beta)
            }
        })*
    };
}

impl_external_blas!(f32, f64, Complex32, Complex64);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lazymat_storage::{DenseMatrix, Layout};

    #[test]
    fn test_operand_layout_flags() {
        let (t, ld) = operand_layout(1, 4, 4, 3).unwrap();
        assert!(matches!(t, CBLAS_TRANSPOSE::CblasNoTrans));
        assert_eq!(ld, 4);
        let (t, ld) = operand_layout(3, 1, 4, 3).unwrap();
        assert!(matches!(t, CBLAS_TRANSPOSE::CblasTrans));
        assert_eq!(ld, 3);
        assert!(operand_layout(2, 8, 4, 4).is_none());
    }

    #[test]
    fn test_blas_row_and_col_major_dest() {
        let a = DenseMatrix::from_fn(3, 4, |i, j| (i * 4 + j) as f64);
        let b = DenseMatrix::from_fn_with_layout(4, 2, Layout::ColMajor, |i, j| (i + 2 * j) as f64);
        for layout in [Layout::RowMajor, Layout::ColMajor] {
            let mut c = DenseMatrix::<f64>::zeros_with_layout(3, 2, layout);
            assert!(blas_gemm(&mut c.view_mut().unwrap(), 1.0, &a.view(), &b.view(), 0.0));
            for i in 0..3 {
                for j in 0..2 {
                    let expected: f64 = (0..4).map(|p| a.get(i, p) * b.get(p, j)).sum();
                    assert_relative_eq!(c.get(i, j), expected);
                }
            }
        }
    }
}
