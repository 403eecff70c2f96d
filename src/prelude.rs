//! `use lazymat::prelude::*;` brings in the containers, the expression
//! traits and [`Assign`].

pub use crate::assign::{Assign, AssignOp};
pub use crate::expr::{Expr, Target};
pub use crate::operand::{AsExpr, IntoExpr};
pub use lazymat_kernel::EvalConfig;
pub use lazymat_storage::{
    DenseMatrix, DenseVector, Layout, LinalgError, Orientation, SparseMatrix, SparseVector,
    StaticMatrix, StaticVector, StructuralForm, Uplo,
};
