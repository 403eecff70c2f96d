//! Lazily evaluated dense and sparse linear algebra.
//!
//! Operators on containers build expression trees; nothing is computed until
//! an expression is assigned into a destination or evaluated. Assignment
//! analyzes whether the destination is read by the expression and only
//! allocates a temporary when in-place evaluation would be wrong.
//!
//! # Core Types
//!
//! - [`DenseMatrix`], [`DenseVector`], [`StaticMatrix`], [`StaticVector`],
//!   [`SparseMatrix`], [`SparseVector`]: containers (from `lazymat-storage`)
//! - [`Expr`]: unevaluated expression; [`AsExpr`] / [`IntoExpr`] turn
//!   containers and views into leaves
//! - [`Assign`]: `assign`, `assign_add`, `assign_sub`, `assign_mul`,
//!   `assign_with`, `assign_configured`
//! - [`EvalConfig`]: kernel thresholds and backend switches
//!
//! # Example
//!
//! ```rust
//! use lazymat::prelude::*;
//!
//! let a = DenseMatrix::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
//! let b = DenseMatrix::<f64>::identity(3);
//! let mut c = DenseMatrix::<f64>::zeros(2, 3);
//!
//! c.assign(a.expr() * &b + &a).unwrap();
//! assert_eq!(c.get(1, 2), 10.0);
//!
//! // The destination may appear on the right-hand side.
//! c.assign_with(|c| c.scale(0.5) - &a).unwrap();
//! assert_eq!(c.get(1, 2), 0.0);
//!
//! // Shape errors surface before the destination is touched.
//! let bad = DenseMatrix::<f64>::zeros(2, 2);
//! assert!(c.assign(a.expr() * &bad).is_err());
//! assert_eq!(c.shape(), (2, 3));
//! ```
//!
//! # Features
//!
//! - `parallel` (default): rayon fan-out of blocked kernels
//! - `simd`: pulp-accelerated sums and dot products
//! - `blas` / `faer`: external matrix products (mutually exclusive)

pub mod alias;
pub mod assign;
mod eval;
pub mod expr;
pub mod operand;
mod ops;
pub mod prelude;

pub use alias::{analyze, analyze_indirect, AliasVerdict};
pub use assign::{Assign, AssignOp, Destination};
pub use expr::{Expr, ExprKind, Target};
pub use operand::{AsExpr, IntoExpr};

pub use lazymat_kernel::{EvalConfig, KernelScalar, Strategy};
pub use lazymat_storage::{
    DenseMatrix, DenseVector, Layout, LinalgError, MatrixMut, MatrixRef, Orientation, ReadKey,
    Result, SparseMatrix, SparseRef, SparseVector, StaticMatrix, StaticVector, StructuralForm, Uplo,
};
pub use lazymat_traits::{ElementOp, Scalar};
