//! Operator overloads building expression nodes.
//!
//! Operators are defined on [`Expr`] and [`Target`]; any [`IntoExpr`] is
//! accepted on the right. Containers enter through `&container` on the right
//! or `container.expr()` on the left:
//!
//! ```ignore
//! let e = a.expr() * &b + &c;      // (a * b) + c
//! let f = 2.0 * (a.expr() - &b);   // scale node
//! let g = -a.expr().adjoint();
//! ```
//!
//! `*` is element-wise for two vectors of the same orientation (length > 1)
//! and a matrix product otherwise.

use std::ops::{Add, Mul, Neg, Sub};

use lazymat_kernel::KernelScalar;
use num_complex::{Complex32, Complex64};

use crate::expr::{BinaryOp, Expr, Target};
use crate::operand::IntoExpr;

macro_rules! impl_binary_ops {
    ($($trait:ident :: $method:ident => $op:ident),*) => {
        $(
            impl<'a, T: KernelScalar, R: IntoExpr<'a, T>> $trait<R> for Expr<'a, T> {
                type Output = Expr<'a, T>;

                #[inline]
                fn $method(self, rhs: R) -> Expr<'a, T> {
                    self.combine(rhs.into_expr(), BinaryOp::$op)
                }
            }

            impl<'a, T: KernelScalar, R: IntoExpr<'a, T>> $trait<R> for Target<'a, T> {
                type Output = Expr<'a, T>;

                #[inline]
                fn $method(self, rhs: R) -> Expr<'a, T> {
                    self.expr().combine(rhs.into_expr(), BinaryOp::$op)
                }
            }
        )*
    };
}

impl_binary_ops!(Add::add => Add, Sub::sub => Sub, Mul::mul => Mul);

impl<'a, T: KernelScalar> Neg for Expr<'a, T> {
    type Output = Expr<'a, T>;

    #[inline]
    fn neg(self) -> Expr<'a, T> {
        self.negate()
    }
}

impl<'a, T: KernelScalar> Neg for Target<'a, T> {
    type Output = Expr<'a, T>;

    #[inline]
    fn neg(self) -> Expr<'a, T> {
        self.expr().negate()
    }
}

// ============================================================================
// Scalar on the left
// ============================================================================

macro_rules! impl_scalar_lhs {
    ($($t:ty),*) => {
        $(
            impl<'a> Mul<Expr<'a, $t>> for $t {
                type Output = Expr<'a, $t>;

                #[inline]
                fn mul(self, rhs: Expr<'a, $t>) -> Expr<'a, $t> {
                    rhs.scale(self)
                }
            }

            impl<'a> Mul<Target<'a, $t>> for $t {
                type Output = Expr<'a, $t>;

                #[inline]
                fn mul(self, rhs: Target<'a, $t>) -> Expr<'a, $t> {
                    rhs.scale(self)
                }
            }
        )*
    };
}

impl_scalar_lhs!(f32, f64, i32, i64, Complex32, Complex64);

// Real scalars promote onto complex expressions.
macro_rules! impl_real_on_complex {
    ($($real:ty => $complex:ty),*) => {
        $(
            impl<'a> Mul<Expr<'a, $complex>> for $real {
                type Output = Expr<'a, $complex>;

                #[inline]
                fn mul(self, rhs: Expr<'a, $complex>) -> Expr<'a, $complex> {
                    rhs.scale_real(self)
                }
            }
        )*
    };
}

impl_real_on_complex!(f32 => Complex32, f64 => Complex64);
