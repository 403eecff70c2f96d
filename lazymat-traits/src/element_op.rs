//! Element operations applied lazily when reading through a view.
//!
//! A view carries an [`ElementOp`] that is applied on every read, so
//! conjugation and adjoint never copy data. For scalar elements transpose is
//! the identity, which leaves two members: `Identity` and `Conj`. They form a
//! group under composition where each element is its own inverse.

use num_complex::Complex;
use num_traits::Num;

// ---------------------------------------------------------------------------
// ElementOpApply: per-type conjugation
// ---------------------------------------------------------------------------

/// Types that can be conjugated.
///
/// The defaults describe real numbers: conjugation is the identity and every
/// value is real. Custom scalars can opt in with an empty impl:
/// ```ignore
/// impl ElementOpApply for MyType {}
/// ```
pub trait ElementOpApply: Copy {
    #[inline(always)]
    fn conj(self) -> Self {
        self
    }

    /// Whether the value equals its own conjugate.
    ///
    /// Hermitian diagonals must satisfy this.
    #[inline(always)]
    fn is_real(self) -> bool {
        true
    }

    /// The value with its imaginary part dropped.
    #[inline(always)]
    fn real_part(self) -> Self {
        self
    }
}

macro_rules! impl_element_op_apply_real {
    ($($t:ty),*) => {
        $(impl ElementOpApply for $t {})*
    };
}

impl_element_op_apply_real!(
    f32, f64, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);

impl<T: Num + Copy + std::ops::Neg<Output = T>> ElementOpApply for Complex<T> {
    #[inline(always)]
    fn conj(self) -> Self {
        Complex::conj(&self)
    }

    #[inline(always)]
    fn is_real(self) -> bool {
        self.im.is_zero()
    }

    #[inline(always)]
    fn real_part(self) -> Self {
        Complex::new(self.re, T::zero())
    }
}

// ---------------------------------------------------------------------------
// ElementOp: runtime element operation carried by views
// ---------------------------------------------------------------------------

/// Operation applied to each element on read.
///
/// ```text
///   compose | Id   | Conj
/// ----------|------|------
///   Id      | Id   | Conj
///   Conj    | Conj | Id
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElementOp {
    #[default]
    Identity,
    Conj,
}

impl ElementOp {
    #[inline(always)]
    pub fn apply<T: ElementOpApply>(self, value: T) -> T {
        match self {
            ElementOp::Identity => value,
            ElementOp::Conj => value.conj(),
        }
    }

    /// `self` followed by `other`.
    #[inline]
    pub fn compose(self, other: ElementOp) -> ElementOp {
        if self == other {
            ElementOp::Identity
        } else {
            ElementOp::Conj
        }
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == ElementOp::Identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_real_conj_is_identity() {
        assert_eq!(3.5f64.conj(), 3.5);
        assert_eq!((-2i32).conj(), -2);
        assert!(1.0f32.is_real());
    }

    #[test]
    fn test_complex_conj() {
        let z = Complex64::new(1.0, 2.0);
        assert_eq!(z.conj(), Complex64::new(1.0, -2.0));
        assert!(!z.is_real());
        assert!(Complex64::new(4.0, 0.0).is_real());
        assert_eq!(z.real_part(), Complex64::new(1.0, 0.0));
        assert_eq!((-2.5f64).real_part(), -2.5);
    }

    #[test]
    fn test_compose_table() {
        use ElementOp::*;
        assert_eq!(Identity.compose(Identity), Identity);
        assert_eq!(Identity.compose(Conj), Conj);
        assert_eq!(Conj.compose(Identity), Conj);
        assert_eq!(Conj.compose(Conj), Identity);
    }

    #[test]
    fn test_apply() {
        let z = Complex64::new(0.5, -1.5);
        assert_eq!(ElementOp::Identity.apply(z), z);
        assert_eq!(ElementOp::Conj.apply(z), Complex64::new(0.5, 1.5));
        assert_eq!(ElementOp::Conj.apply(ElementOp::Conj.apply(z)), z);
    }
}
