//! Scalar type bounds for lazymat containers and kernels.

use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

use num_traits::{One, Zero};

use crate::element_op::ElementOpApply;

/// Element types storable in lazymat containers.
///
/// Requires a ring (`Add`, `Sub`, `Mul`, `Neg`, `Zero`, `One`) plus
/// [`ElementOpApply`] so conjugating views and Hermitian storage can be read
/// uniformly for real and complex elements.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + Zero
    + One
    + ElementOpApply
    + 'static
{
}

impl<T> Scalar for T where
    T: Copy
        + Send
        + Sync
        + Debug
        + PartialEq
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Neg<Output = T>
        + Zero
        + One
        + ElementOpApply
        + 'static
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::{Complex32, Complex64};

    fn assert_scalar<T: Scalar>() {}

    #[test]
    fn test_standard_types() {
        assert_scalar::<f32>();
        assert_scalar::<f64>();
        assert_scalar::<i32>();
        assert_scalar::<i64>();
        assert_scalar::<Complex32>();
        assert_scalar::<Complex64>();
    }

    #[test]
    fn test_custom_ring_type() {
        #[derive(Debug, Clone, Copy, PartialEq)]
        struct Mod7(u8);

        impl Add for Mod7 {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Mod7((self.0 + rhs.0) % 7)
            }
        }
        impl Sub for Mod7 {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Mod7((self.0 + 7 - rhs.0) % 7)
            }
        }
        impl Mul for Mod7 {
            type Output = Self;
            fn mul(self, rhs: Self) -> Self {
                Mod7((self.0 * rhs.0) % 7)
            }
        }
        impl Neg for Mod7 {
            type Output = Self;
            fn neg(self) -> Self {
                Mod7((7 - self.0) % 7)
            }
        }
        impl Zero for Mod7 {
            fn zero() -> Self {
                Mod7(0)
            }
            fn is_zero(&self) -> bool {
                self.0 == 0
            }
        }
        impl One for Mod7 {
            fn one() -> Self {
                Mod7(1)
            }
        }
        impl ElementOpApply for Mod7 {}

        assert_scalar::<Mod7>();

        let a = Mod7(5);
        let b = Mod7(4);
        assert_eq!(a + b, Mod7(2));
        assert_eq!(a * b, Mod7(6));
        assert_eq!(a - b, Mod7(1));
        assert_eq!(-a, Mod7(2));
        assert_eq!(a.conj(), a);
    }
}
