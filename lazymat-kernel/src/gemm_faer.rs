//! faer-backed matrix product.
//!
//! faer accepts arbitrary strides, so any plain dense operand is handled
//! without copying. `beta` must be zero or one ([`Accum::Replace`] or
//! [`Accum::Add`]).

use faer::linalg::matmul::matmul_with_conj;
use faer::mat::{MatMut, MatRef};
use faer::{Accum, Conj, Par};
use faer_traits::ComplexField;
use lazymat_storage::{MatrixMut, MatrixRef, Scalar};

use crate::backend::ExternalGemm;

fn faer_gemm<T: ComplexField + Scalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    beta: T,
) -> bool {
    if !a.is_plain() || !b.is_plain() {
        return false;
    }
    let accum = if beta == T::zero() {
        Accum::Replace
    } else if beta == T::one() {
        Accum::Add
    } else {
        return false;
    };
    let (m, k) = a.shape();
    let n = b.cols();
    tracing::trace!(m, n, k, "faer matmul");
    unsafe {
        let a_mat: MatRef<'_, T> =
            MatRef::from_raw_parts(a.as_ptr(), m, k, a.row_stride(), a.col_stride());
        let b_mat: MatRef<'_, T> =
            MatRef::from_raw_parts(b.as_ptr(), k, n, b.row_stride(), b.col_stride());
        let c_mat: MatMut<'_, T> = MatMut::from_raw_parts_mut(
            dest.as_mut_ptr(),
            m,
            n,
            dest.row_stride(),
            dest.col_stride(),
        );
        matmul_with_conj(c_mat, accum, a_mat, Conj::No, b_mat, Conj::No, alpha, Par::Seq);
    }
    true
}

macro_rules! impl_external_faer {
    ($($t:ty),*) => {
        $(impl ExternalGemm for $t {
            fn external_gemm(
                dest: &mut MatrixMut<'_, $t>,
                alpha: $t,
                a: &MatrixRef<'_, $t>,
                b: &MatrixRef<'_, $t>,
                beta: $t,
            ) -> bool {
                faer_gemm(dest, alpha, a, b, beta)
            }
        })*
    };
}

impl_external_faer!(f32, f64);
