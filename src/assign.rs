//! Assignment engine.
//!
//! `dest.assign(expr)` validates the expression, checks shapes, analyzes
//! aliasing between the destination and the expression leaves and then picks
//! one of three paths:
//!
//! | verdict | general dense destination | structured / sparse destination |
//! |---|---|---|
//! | `NoOverlap` | kernels write the destination directly | temporary, validated commit |
//! | `SafeOverlap` | products into temporaries, then one fused element-wise pass | temporary, validated commit |
//! | `UnsafeOverlap` | temporary, then a copy | temporary, validated commit |
//!
//! Structured and sparse destinations are classified with
//! [`analyze_indirect`](crate::alias::analyze_indirect), so `S += S` reads as
//! `SafeOverlap` there too. Commits into symmetric and Hermitian storage keep
//! the stored triangle of the result, and a Hermitian diagonal keeps its real
//! part.
//!
//! Every error (shape, allocation, structural representability) is reported
//! before the destination is written, so a failed assignment leaves it
//! unchanged.

use lazymat_kernel::{dispatch, naive, EvalConfig, KernelScalar, Mode};
use lazymat_storage::{
    BufferSpan, DenseMatrix, DenseVector, Layout, LinalgError, MatrixMut, Orientation, Result,
    SparseMatrix, SparseVector, StaticMatrix, StaticVector,
};
use tracing::debug;

use crate::alias::{self, AliasVerdict};
use crate::eval;
use crate::expr::{Expr, Target};
use crate::operand::IntoExpr;

/// Compound operator of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `dest = expr`
    Set,
    /// `dest = dest + expr`
    Add,
    /// `dest = dest - expr`
    Sub,
    /// `dest = dest * expr`, with the shape inference of `*`.
    Mul,
}

// ============================================================================
// Destinations
// ============================================================================

/// Storage that can receive the result of an assignment.
pub trait Destination<T: KernelScalar> {
    fn dest_shape(&self) -> (usize, usize);

    /// Whether a `Set` may give the destination a new shape.
    fn accepts_shape(&self, shape: (usize, usize)) -> bool;

    /// Layout of temporaries that will be committed here.
    fn temp_layout(&self) -> Layout {
        Layout::RowMajor
    }

    /// General dense view for in-place evaluation, if the storage has one.
    fn direct(&mut self) -> Option<MatrixMut<'_, T>>;

    /// The current contents as an expression leaf.
    fn current(&self) -> Expr<'_, T>;

    fn dest_span(&self) -> BufferSpan;

    /// Replace the contents with `temp`. On error nothing changes.
    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()>;
}

fn check_fixed_shape(have: (usize, usize), temp: &DenseMatrix<impl KernelScalar>) -> Result<()> {
    if have == temp.shape() {
        Ok(())
    } else {
        Err(LinalgError::ShapeMismatch(have, temp.shape()))
    }
}

fn copy_into<T: KernelScalar>(mut dest: MatrixMut<'_, T>, temp: &DenseMatrix<T>) -> Result<()> {
    check_fixed_shape(dest.shape(), temp)?;
    naive::scaled_copy(&mut dest, T::one(), &temp.view(), Mode::Set);
    Ok(())
}

fn vector_layout(o: Orientation) -> Layout {
    match o {
        Orientation::Column => Layout::ColMajor,
        Orientation::Row => Layout::RowMajor,
    }
}

impl<T: KernelScalar> Destination<T> for DenseMatrix<T> {
    fn dest_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn accepts_shape(&self, shape: (usize, usize)) -> bool {
        self.form().is_general() || shape.0 == shape.1
    }

    fn temp_layout(&self) -> Layout {
        self.layout()
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        self.view_mut().ok()
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        self.replace(temp)
    }
}

impl<T: KernelScalar> Destination<T> for DenseVector<T> {
    fn dest_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn accepts_shape(&self, shape: (usize, usize)) -> bool {
        Orientation::of_shape(shape, self.orientation()) == Some(self.orientation())
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        Some(self.view_mut())
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        self.set_from(&temp.view())
    }
}

impl<T: KernelScalar, const R: usize, const C: usize> Destination<T> for StaticMatrix<T, R, C> {
    fn dest_shape(&self) -> (usize, usize) {
        (R, C)
    }

    fn accepts_shape(&self, _shape: (usize, usize)) -> bool {
        false
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        Some(self.view_mut())
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        copy_into(self.view_mut(), &temp)
    }
}

impl<T: KernelScalar, const N: usize> Destination<T> for StaticVector<T, N> {
    fn dest_shape(&self) -> (usize, usize) {
        (N, 1)
    }

    fn accepts_shape(&self, _shape: (usize, usize)) -> bool {
        false
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        Some(self.view_mut())
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::dense(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        copy_into(self.view_mut(), &temp)
    }
}

impl<T: KernelScalar> Destination<T> for MatrixMut<'_, T> {
    fn dest_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn accepts_shape(&self, _shape: (usize, usize)) -> bool {
        false
    }

    fn temp_layout(&self) -> Layout {
        self.contiguous_layout().unwrap_or_default()
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        Some(self.rb_mut())
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::dense(self.rb())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        copy_into(self.rb_mut(), &temp)
    }
}

impl<T: KernelScalar> Destination<T> for SparseMatrix<T> {
    fn dest_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn accepts_shape(&self, _shape: (usize, usize)) -> bool {
        true
    }

    fn temp_layout(&self) -> Layout {
        self.layout()
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        None
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::sparse(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        *self = SparseMatrix::from_view(&temp.view(), self.layout());
        Ok(())
    }
}

impl<T: KernelScalar> Destination<T> for SparseVector<T> {
    fn dest_shape(&self) -> (usize, usize) {
        self.shape()
    }

    fn accepts_shape(&self, shape: (usize, usize)) -> bool {
        Orientation::of_shape(shape, self.orientation()) == Some(self.orientation())
    }

    fn temp_layout(&self) -> Layout {
        vector_layout(self.orientation())
    }

    fn direct(&mut self) -> Option<MatrixMut<'_, T>> {
        None
    }

    fn current(&self) -> Expr<'_, T> {
        Expr::sparse(self.view())
    }

    fn dest_span(&self) -> BufferSpan {
        self.span()
    }

    fn commit(&mut self, temp: DenseMatrix<T>) -> Result<()> {
        let layout = vector_layout(self.orientation());
        self.set_from_matrix(SparseMatrix::from_view(&temp.view(), layout))
    }
}

// ============================================================================
// Assign
// ============================================================================

/// Assignment of expressions into a destination.
///
/// ```ignore
/// c.assign(a.expr() * &b)?;                 // c = a * b
/// c.assign_add(&a)?;                        // c += a
/// c.assign_with(|c| c.transpose() * &a)?;   // c = c^T * a
/// ```
pub trait Assign<T: KernelScalar> {
    /// `self = self op f(self)` under `cfg`.
    ///
    /// `f` receives a handle to the destination so the right-hand side can
    /// read it.
    fn assign_op_with<'e, F, E>(&mut self, op: AssignOp, cfg: &EvalConfig, f: F) -> Result<()>
    where
        F: FnOnce(Target<'e, T>) -> E,
        E: IntoExpr<'e, T>;

    fn assign<'e>(&mut self, expr: impl IntoExpr<'e, T>) -> Result<()> {
        self.assign_op_with(AssignOp::Set, EvalConfig::global(), move |_| expr)
    }

    fn assign_add<'e>(&mut self, expr: impl IntoExpr<'e, T>) -> Result<()> {
        self.assign_op_with(AssignOp::Add, EvalConfig::global(), move |_| expr)
    }

    fn assign_sub<'e>(&mut self, expr: impl IntoExpr<'e, T>) -> Result<()> {
        self.assign_op_with(AssignOp::Sub, EvalConfig::global(), move |_| expr)
    }

    fn assign_mul<'e>(&mut self, expr: impl IntoExpr<'e, T>) -> Result<()> {
        self.assign_op_with(AssignOp::Mul, EvalConfig::global(), move |_| expr)
    }

    /// `self = f(self)`.
    fn assign_with<'e, F, E>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(Target<'e, T>) -> E,
        E: IntoExpr<'e, T>,
    {
        self.assign_op_with(AssignOp::Set, EvalConfig::global(), f)
    }

    /// `self = expr` with an explicit configuration.
    fn assign_configured<'e>(&mut self, expr: impl IntoExpr<'e, T>, cfg: &EvalConfig) -> Result<()> {
        self.assign_op_with(AssignOp::Set, cfg, move |_| expr)
    }
}

impl<T: KernelScalar, D: Destination<T> + ?Sized> Assign<T> for D {
    fn assign_op_with<'e, F, E>(&mut self, op: AssignOp, cfg: &EvalConfig, f: F) -> Result<()>
    where
        F: FnOnce(Target<'e, T>) -> E,
        E: IntoExpr<'e, T>,
    {
        let shape = self.dest_shape();
        let target = Target::new(shape);
        let id = target.id();
        let rhs = f(target).into_expr();
        rhs.validate()?;

        let mode = match op {
            AssignOp::Set if rhs.shape() == shape => Some(Mode::Set),
            AssignOp::Set if self.accepts_shape(rhs.shape()) => None,
            AssignOp::Add | AssignOp::Sub if rhs.shape() == shape => {
                Some(if op == AssignOp::Add { Mode::Add } else { Mode::Sub })
            }
            AssignOp::Mul => None,
            _ => return Err(LinalgError::ShapeMismatch(shape, rhs.shape())),
        };

        if let Some(mode) = mode {
            if let Some(mut view) = self.direct() {
                return in_place(&mut view, rhs, id, op, mode, cfg);
            }
        }
        through_temporary(self, rhs, id, op, cfg)
    }
}

fn in_place<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    rhs: Expr<'_, T>,
    id: u64,
    op: AssignOp,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<()> {
    // SAFETY: the alias is read either while lowering (before any write),
    // by the fused pass (each element before it is written) or, on unsafe
    // overlap, only into a temporary that is complete before the copy.
    let current = Expr::dense(unsafe { dest.alias() });
    let expr = rhs.bind_target(id, &current)?;
    let verdict = alias::analyze(dest.span(), Some(dest.mapping()), &expr);
    match verdict {
        AliasVerdict::NoOverlap => {
            let plan = eval::lower(&expr, cfg)?;
            debug!(?op, ?verdict, temporaries = plan.temporaries(), "assign in place");
            eval::exec(&plan, T::one(), dest, mode, cfg)
        }
        AliasVerdict::SafeOverlap => {
            // Products never read the destination here, so they can run
            // through their kernels before the fused pass.
            let plan = eval::hoist_products(eval::lower(&expr, cfg)?, cfg)?;
            debug!(?op, ?verdict, temporaries = plan.temporaries(), "assign with fused pass");
            eval::exec_fused(&plan, dest, mode)
        }
        AliasVerdict::UnsafeOverlap => {
            let temp = eval::materialize(&expr, dest.contiguous_layout().unwrap_or_default(), cfg)?;
            debug!(?op, ?verdict, rows = temp.rows(), cols = temp.columns(), "assign through temporary");
            dispatch::scaled_copy(dest, T::one(), &temp.view(), mode, cfg)?;
            Ok(())
        }
    }
}

fn through_temporary<T, D>(dest: &mut D, rhs: Expr<'_, T>, id: u64, op: AssignOp, cfg: &EvalConfig) -> Result<()>
where
    T: KernelScalar,
    D: Destination<T> + ?Sized,
{
    let shape = dest.dest_shape();
    let temp = {
        let current = dest.current();
        let rhs = rhs.bind_target(id, &current)?;
        let expr = match op {
            AssignOp::Set => rhs,
            AssignOp::Add => current.clone() + rhs,
            AssignOp::Sub => current.clone() - rhs,
            AssignOp::Mul => current.clone() * rhs,
        };
        expr.validate()?;
        if expr.shape() != shape && !dest.accepts_shape(expr.shape()) {
            return Err(LinalgError::ShapeMismatch(shape, expr.shape()));
        }
        let verdict = match alias::leaf_key(&current) {
            Some(key) => alias::analyze_indirect(dest.dest_span(), key, &expr),
            None => alias::analyze(dest.dest_span(), None, &expr),
        };
        debug!(?op, ?verdict, rows = expr.rows(), cols = expr.cols(), "assign through temporary");
        eval::materialize(&expr, dest.temp_layout(), cfg)?
    };
    dest.commit(temp)
}
