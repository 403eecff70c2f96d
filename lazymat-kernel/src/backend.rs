//! External GEMM backends.
//!
//! [`ExternalGemm`] is the per-element-type hook the dispatcher calls for
//! [`Strategy::External`](crate::Strategy::External). The default
//! implementation refuses, which makes the dispatcher fall back to the blocked
//! product. [`ActiveBackend`] is the single point of backend selection by
//! Cargo feature.

use lazymat_storage::{MatrixMut, MatrixRef};
use num_complex::{Complex32, Complex64};

/// Element types an external backend may multiply.
pub trait ExternalGemm: Sized {
    /// `dest = alpha * a * b + beta * dest`.
    ///
    /// Returns `false` without touching `dest` when the backend does not
    /// handle this element type, these strides or this `beta`.
    fn external_gemm(
        _dest: &mut MatrixMut<'_, Self>,
        _alpha: Self,
        _a: &MatrixRef<'_, Self>,
        _b: &MatrixRef<'_, Self>,
        _beta: Self,
    ) -> bool {
        false
    }
}

macro_rules! impl_no_external {
    ($($t:ty),*) => {
        $(impl ExternalGemm for $t {})*
    };
}

impl_no_external!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

#[cfg(not(any(feature = "blas", feature = "faer")))]
impl_no_external!(f32, f64, Complex32, Complex64);

// faer handles real types only here.
#[cfg(feature = "faer")]
impl_no_external!(Complex32, Complex64);

/// Static description of a GEMM backend.
pub trait BackendConfig {
    const NAME: &'static str;
    /// Whether operands need a unit stride in one dimension (CBLAS does).
    const REQUIRES_UNIT_STRIDE: bool;
}

/// CBLAS `?gemm` through `cblas-sys`.
#[cfg(feature = "blas")]
pub struct BlasBackend;

#[cfg(feature = "blas")]
impl BackendConfig for BlasBackend {
    const NAME: &'static str = "blas";
    const REQUIRES_UNIT_STRIDE: bool = true;
}

/// faer's matmul.
#[cfg(feature = "faer")]
pub struct FaerBackend;

#[cfg(feature = "faer")]
impl BackendConfig for FaerBackend {
    const NAME: &'static str = "faer";
    const REQUIRES_UNIT_STRIDE: bool = false;
}

/// No external library; every request is refused.
#[allow(dead_code)]
pub struct NoBackend;

impl BackendConfig for NoBackend {
    const NAME: &'static str = "none";
    const REQUIRES_UNIT_STRIDE: bool = false;
}

#[cfg(all(feature = "faer", not(feature = "blas")))]
pub type ActiveBackend = FaerBackend;

#[cfg(all(feature = "blas", not(feature = "faer")))]
pub type ActiveBackend = BlasBackend;

#[cfg(not(any(feature = "faer", feature = "blas")))]
pub type ActiveBackend = NoBackend;

/// Placeholder for the invalid `blas` + `faer` combination; `compile_error!`
/// in `lib.rs` fires first.
#[cfg(all(feature = "faer", feature = "blas"))]
pub type ActiveBackend = NoBackend;

/// Whether an external backend is compiled in.
pub fn external_available() -> bool {
    cfg!(any(feature = "blas", feature = "faer"))
}

/// Name of the compiled-in backend, for logging.
pub fn backend_name() -> &'static str {
    <ActiveBackend as BackendConfig>::NAME
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazymat_storage::DenseMatrix;

    #[test]
    fn test_integers_always_refuse() {
        let a = DenseMatrix::<i64>::identity(2);
        let mut c = DenseMatrix::<i64>::filled(2, 2, 7);
        let accepted = i64::external_gemm(&mut c.view_mut().unwrap(), 1, &a.view(), &a.view(), 0);
        assert!(!accepted);
        assert_eq!(c.as_slice(), &[7, 7, 7, 7]);
    }

    #[test]
    fn test_backend_name_matches_features() {
        if external_available() {
            assert_ne!(backend_name(), "none");
        } else {
            assert_eq!(backend_name(), "none");
        }
    }
}
