//! Scalar-loop kernels.
//!
//! Every read goes through [`MatrixRef::get_unchecked`], so structural forms
//! (mirrored, implied zero/one) and lazy conjugation are honored for any
//! stride pattern. Each element of the destination is read (for `Add`/`Sub`)
//! and written exactly once, after all source reads for that element: a source
//! that maps exactly onto the destination is therefore safe.

use lazymat_storage::{MatrixMut, MatrixRef, Scalar};

use crate::Mode;

/// `dest op= alpha * src`.
pub fn scaled_copy<T: Scalar>(dest: &mut MatrixMut<'_, T>, alpha: T, src: &MatrixRef<'_, T>, mode: Mode) {
    debug_assert_eq!(dest.shape(), src.shape());
    let (rows, cols) = dest.shape();
    let is_alpha_one = alpha == T::one();
    for i in 0..rows {
        for j in 0..cols {
            unsafe {
                let v = src.get_unchecked(i, j);
                let v = if is_alpha_one { v } else { alpha * v };
                let d = dest.get_unchecked(i, j);
                dest.set_unchecked(i, j, mode.combine(d, v));
            }
        }
    }
}

/// `dest op= alpha * (a .* b)`.
pub fn hadamard<T: Scalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    mode: Mode,
) {
    debug_assert_eq!(dest.shape(), a.shape());
    debug_assert_eq!(a.shape(), b.shape());
    let (rows, cols) = dest.shape();
    for i in 0..rows {
        for j in 0..cols {
            unsafe {
                let v = alpha * (a.get_unchecked(i, j) * b.get_unchecked(i, j));
                let d = dest.get_unchecked(i, j);
                dest.set_unchecked(i, j, mode.combine(d, v));
            }
        }
    }
}

/// `dest op= alpha * a * b`.
///
/// The destination must not overlap `a` or `b`.
pub fn gemm<T: Scalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    mode: Mode,
) {
    let (m, k) = a.shape();
    let n = b.cols();
    debug_assert_eq!(b.rows(), k);
    debug_assert_eq!(dest.shape(), (m, n));
    let is_alpha_one = alpha == T::one();
    for i in 0..m {
        for j in 0..n {
            let mut acc = T::zero();
            for p in 0..k {
                unsafe {
                    acc = acc + a.get_unchecked(i, p) * b.get_unchecked(p, j);
                }
            }
            let v = if is_alpha_one { acc } else { alpha * acc };
            unsafe {
                let d = dest.get_unchecked(i, j);
                dest.set_unchecked(i, j, mode.combine(d, v));
            }
        }
    }
}

/// Sum of all logical elements, row by row.
pub fn sum<T: Scalar>(src: &MatrixRef<'_, T>) -> T {
    let mut acc = T::zero();
    for i in 0..src.rows() {
        for j in 0..src.cols() {
            acc = acc + unsafe { src.get_unchecked(i, j) };
        }
    }
    acc
}

/// `sum(a[i][j] * b[i][j])` over two equally shaped views.
pub fn dot<T: Scalar>(a: &MatrixRef<'_, T>, b: &MatrixRef<'_, T>) -> T {
    debug_assert_eq!(a.shape(), b.shape());
    let mut acc = T::zero();
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            acc = acc + unsafe { a.get_unchecked(i, j) * b.get_unchecked(i, j) };
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazymat_storage::{DenseMatrix, Layout, StructuralForm};
    use num_complex::Complex64;

    #[test]
    fn test_scaled_copy_modes() {
        let src = DenseMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut dst = DenseMatrix::<f64>::filled(2, 2, 10.0);
        {
            let mut d = dst.view_mut().unwrap();
            scaled_copy(&mut d, 2.0, &src.view(), Mode::Sub);
        }
        assert_eq!(dst.as_slice(), &[8.0, 6.0, 4.0, 2.0]);
        {
            let mut d = dst.view_mut().unwrap();
            scaled_copy(&mut d, 1.0, &src.view(), Mode::Set);
        }
        assert_eq!(dst.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_scaled_copy_reads_structure() {
        let mut sym = DenseMatrix::<f64>::structured(2, StructuralForm::Symmetric);
        sym.set(1, 0, 5.0).unwrap();
        let mut dst = DenseMatrix::<f64>::zeros(2, 2);
        scaled_copy(&mut dst.view_mut().unwrap(), 1.0, &sym.view(), Mode::Set);
        assert_eq!(dst.as_slice(), &[0.0, 5.0, 5.0, 0.0]);
    }

    #[test]
    fn test_gemm_col_major_with_conj() {
        let a = DenseMatrix::from_fn_with_layout(2, 3, Layout::ColMajor, |i, j| {
            Complex64::new((i + j) as f64, 1.0)
        });
        let b = DenseMatrix::from_fn(3, 1, |i, _| Complex64::new(i as f64, 0.0));
        let mut c = DenseMatrix::<Complex64>::zeros(2, 1);
        gemm(
            &mut c.view_mut().unwrap(),
            Complex64::new(1.0, 0.0),
            &a.view().conj(),
            &b.view(),
            Mode::Set,
        );
        // row 0: conj(0+i)*0 + conj(1+i)*1 + conj(2+i)*2 = 5 - 3i
        assert_eq!(c.get(0, 0), Complex64::new(5.0, -3.0));
        assert_eq!(c.get(1, 0), Complex64::new(8.0, -3.0));
    }

    #[test]
    fn test_gemm_accumulates() {
        let a = DenseMatrix::from_row_slice(2, 2, &[1, 2, 3, 4]).unwrap();
        let mut c = DenseMatrix::<i64>::filled(2, 2, 1);
        gemm(&mut c.view_mut().unwrap(), 2, &a.view(), &a.view(), Mode::Add);
        // a*a = [[7,10],[15,22]]
        assert_eq!(c.as_slice(), &[15, 21, 31, 45]);
    }

    #[test]
    fn test_sum_and_dot() {
        let a = DenseMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(sum(&a.view()), 10.0);
        assert_eq!(dot(&a.view(), &a.view().transpose()), 1.0 + 6.0 + 6.0 + 16.0);
    }
}
