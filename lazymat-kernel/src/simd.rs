//! SIMD sum and dot products.
//!
//! [`MaybeSimdOps`] defaults to "no SIMD" (`None`); with the `simd` feature
//! `f32` and `f64` route through pulp's runtime-dispatched vector width.

/// Run `f` under pulp's best available instruction set when `len` is large
/// enough to pay for the dispatch.
#[inline(always)]
pub(crate) fn dispatch_if_large<R>(len: usize, f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        if len >= 64 {
            return pulp::Arch::new().dispatch(f);
        }
    }
    let _ = len;
    f()
}

/// Element types that may have SIMD-accelerated reductions.
pub trait MaybeSimdOps: Copy + Sized {
    /// Sum of `src`, or `None` without a SIMD kernel for this type.
    fn try_simd_sum(_src: &[Self]) -> Option<Self> {
        None
    }

    /// `sum(a[i] * b[i])`, or `None` without a SIMD kernel for this type.
    ///
    /// `a` and `b` must have the same length.
    fn try_simd_dot(_a: &[Self], _b: &[Self]) -> Option<Self> {
        None
    }
}

macro_rules! impl_no_simd {
    ($($t:ty),*) => {
        $(impl MaybeSimdOps for $t {})*
    };
}

impl_no_simd!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl<T: num_traits::Num + Copy + std::ops::Neg<Output = T>> MaybeSimdOps
    for num_complex::Complex<T>
{
}

#[cfg(not(feature = "simd"))]
impl_no_simd!(f32, f64);

#[cfg(feature = "simd")]
mod simd_impls {
    use super::MaybeSimdOps;
    use pulp::{Simd, WithSimd};

    macro_rules! impl_simd_float {
        ($t:ty, $as_simd:ident, $splat:ident, $add:ident, $fma:ident, $reduce:ident) => {
            impl MaybeSimdOps for $t {
                fn try_simd_sum(src: &[$t]) -> Option<$t> {
                    struct Sum<'a>(&'a [$t]);
                    impl WithSimd for Sum<'_> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> $t {
                            let (head, tail) = S::$as_simd(self.0);
                            let mut acc = [simd.$splat(0.0); 4];
                            let mut chunks = head.chunks_exact(4);
                            for c in &mut chunks {
                                acc[0] = simd.$add(acc[0], c[0]);
                                acc[1] = simd.$add(acc[1], c[1]);
                                acc[2] = simd.$add(acc[2], c[2]);
                                acc[3] = simd.$add(acc[3], c[3]);
                            }
                            for &v in chunks.remainder() {
                                acc[0] = simd.$add(acc[0], v);
                            }
                            let total =
                                simd.$add(simd.$add(acc[0], acc[1]), simd.$add(acc[2], acc[3]));
                            simd.$reduce(total) + tail.iter().sum::<$t>()
                        }
                    }
                    Some(pulp::Arch::new().dispatch(Sum(src)))
                }

                fn try_simd_dot(a: &[$t], b: &[$t]) -> Option<$t> {
                    struct Dot<'a>(&'a [$t], &'a [$t]);
                    impl WithSimd for Dot<'_> {
                        type Output = $t;

                        #[inline(always)]
                        fn with_simd<S: Simd>(self, simd: S) -> $t {
                            debug_assert_eq!(self.0.len(), self.1.len());
                            let (ah, at) = S::$as_simd(self.0);
                            let (bh, bt) = S::$as_simd(self.1);
                            let mut acc = [simd.$splat(0.0); 4];
                            let mut i = 0usize;
                            while i + 4 <= ah.len() {
                                acc[0] = simd.$fma(ah[i], bh[i], acc[0]);
                                acc[1] = simd.$fma(ah[i + 1], bh[i + 1], acc[1]);
                                acc[2] = simd.$fma(ah[i + 2], bh[i + 2], acc[2]);
                                acc[3] = simd.$fma(ah[i + 3], bh[i + 3], acc[3]);
                                i += 4;
                            }
                            for j in i..ah.len() {
                                acc[0] = simd.$fma(ah[j], bh[j], acc[0]);
                            }
                            let total =
                                simd.$add(simd.$add(acc[0], acc[1]), simd.$add(acc[2], acc[3]));
                            let mut s = simd.$reduce(total);
                            for (&x, &y) in at.iter().zip(bt) {
                                s += x * y;
                            }
                            s
                        }
                    }
                    if a.len() != b.len() {
                        return None;
                    }
                    Some(pulp::Arch::new().dispatch(Dot(a, b)))
                }
            }
        };
    }

    impl_simd_float!(f32, as_simd_f32s, splat_f32s, add_f32s, mul_add_f32s, reduce_sum_f32s);
    impl_simd_float!(f64, as_simd_f64s, splat_f64s, add_f64s, mul_add_f64s, reduce_sum_f64s);
}

/// Sum of a slice, SIMD when available.
pub fn slice_sum<T: MaybeSimdOps + num_traits::Zero + std::ops::Add<Output = T>>(src: &[T]) -> T {
    T::try_simd_sum(src).unwrap_or_else(|| src.iter().fold(T::zero(), |acc, &x| acc + x))
}

/// Dot product of two equal-length slices, SIMD when available.
pub fn slice_dot<T>(a: &[T], b: &[T]) -> T
where
    T: MaybeSimdOps + num_traits::Zero + std::ops::Add<Output = T> + std::ops::Mul<Output = T>,
{
    debug_assert_eq!(a.len(), b.len());
    T::try_simd_dot(a, b).unwrap_or_else(|| {
        a.iter()
            .zip(b)
            .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
    })
}
