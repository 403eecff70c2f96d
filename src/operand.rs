//! Conversions from containers and views into expression leaves.

use lazymat_kernel::KernelScalar;
use lazymat_storage::{
    DenseMatrix, DenseVector, MatrixMut, MatrixRef, SparseMatrix, SparseRef, SparseVector,
    StaticMatrix, StaticVector,
};

use crate::expr::{Expr, Target};

/// Anything usable as an operand of an expression.
///
/// Containers take part by reference (`&a + &b`); views, targets and
/// expressions by value.
pub trait IntoExpr<'a, T> {
    fn into_expr(self) -> Expr<'a, T>;
}

/// Containers and views that can be read as an expression leaf.
///
/// `a.expr()` starts a chain of unary operations or serves as the left
/// operand of an operator, since operators are defined on [`Expr`].
pub trait AsExpr<T> {
    fn expr(&self) -> Expr<'_, T>;
}

impl<'a, T: KernelScalar> IntoExpr<'a, T> for Expr<'a, T> {
    #[inline]
    fn into_expr(self) -> Expr<'a, T> {
        self
    }
}

impl<'a, T: KernelScalar> IntoExpr<'a, T> for Target<'a, T> {
    #[inline]
    fn into_expr(self) -> Expr<'a, T> {
        self.expr()
    }
}

impl<'a, T: KernelScalar> IntoExpr<'a, T> for MatrixRef<'a, T> {
    #[inline]
    fn into_expr(self) -> Expr<'a, T> {
        Expr::dense(self)
    }
}

impl<'a, T: KernelScalar> IntoExpr<'a, T> for SparseRef<'a, T> {
    #[inline]
    fn into_expr(self) -> Expr<'a, T> {
        Expr::sparse(self)
    }
}

impl<'a, T, C> IntoExpr<'a, T> for &'a C
where
    T: KernelScalar,
    C: AsExpr<T> + ?Sized,
{
    #[inline]
    fn into_expr(self) -> Expr<'a, T> {
        self.expr()
    }
}

// ============================================================================
// AsExpr impls
// ============================================================================

impl<T: KernelScalar> AsExpr<T> for DenseMatrix<T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }
}

impl<T: KernelScalar> AsExpr<T> for DenseVector<T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }
}

impl<T: KernelScalar, const R: usize, const C: usize> AsExpr<T> for StaticMatrix<T, R, C> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }
}

impl<T: KernelScalar, const N: usize> AsExpr<T> for StaticVector<T, N> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }
}

impl<T: KernelScalar> AsExpr<T> for SparseMatrix<T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::sparse(self.view())
    }
}

impl<T: KernelScalar> AsExpr<T> for SparseVector<T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::sparse(self.view())
    }
}

impl<T: KernelScalar> AsExpr<T> for MatrixRef<'_, T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(*self)
    }
}

impl<T: KernelScalar> AsExpr<T> for MatrixMut<'_, T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::dense(self.rb())
    }
}

impl<T: KernelScalar> AsExpr<T> for SparseRef<'_, T> {
    fn expr(&self) -> Expr<'_, T> {
        Expr::sparse(*self)
    }
}

impl<T: KernelScalar> AsExpr<T> for Expr<'_, T> {
    fn expr(&self) -> Expr<'_, T> {
        self.clone()
    }
}
