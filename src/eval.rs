//! Recursive evaluator.
//!
//! An [`Expr`] is first lowered into a [`Plan`]: every subtree that cannot
//! be fed to a kernel directly (transposed or windowed composites, casts,
//! non-leaf Hadamard or product operands) is materialized into a temporary
//! during lowering. Executing the plan then only runs kernels, so the
//! destination is never written before every temporary exists.
//!
//! Execution threads a scale factor and a [`Mode`] down the tree:
//! `dest = a + b` runs as `dest = a; dest += b`, `dest -= s * (a - b)` as
//! `dest -= s * a; dest += s * b`.

use lazymat_kernel::{dispatch, EvalConfig, KernelScalar, Mode, Operand};
use lazymat_storage::{
    DenseMatrix, ElementOpApply, Layout, LinalgError, MatrixMut, MatrixRef, Result, SparseRef,
};
use tracing::debug;

use crate::expr::{Expr, Node};

// ============================================================================
// Temporaries
// ============================================================================

/// A materialized subtree seen through a lazy transpose, conjugation and
/// window.
pub(crate) struct Derived<T> {
    matrix: DenseMatrix<T>,
    transposed: bool,
    conj: bool,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
}

impl<T: KernelScalar> Derived<T> {
    fn new(matrix: DenseMatrix<T>) -> Self {
        let (rows, cols) = matrix.shape();
        Self {
            matrix,
            transposed: false,
            conj: false,
            row0: 0,
            col0: 0,
            rows,
            cols,
        }
    }

    fn is_whole(&self) -> bool {
        !self.transposed && !self.conj && (self.rows, self.cols) == self.matrix.shape()
    }

    fn transpose(self) -> Self {
        Self {
            transposed: !self.transposed,
            row0: self.col0,
            col0: self.row0,
            rows: self.cols,
            cols: self.rows,
            ..self
        }
    }

    fn conj(self) -> Self {
        Self {
            conj: !self.conj,
            ..self
        }
    }

    fn window(self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self {
            row0: self.row0 + row,
            col0: self.col0 + col,
            rows,
            cols,
            ..self
        }
    }

    fn view(&self) -> Result<MatrixRef<'_, T>> {
        let v = self.matrix.view();
        let v = if self.transposed { v.transpose() } else { v };
        let v = v.submatrix(self.row0, self.col0, self.rows, self.cols)?;
        Ok(if self.conj { v.conj() } else { v })
    }

    fn at(&self, i: usize, j: usize) -> T {
        let (r, c) = (self.row0 + i, self.col0 + j);
        let (r, c) = if self.transposed { (c, r) } else { (r, c) };
        let v = self.matrix.get(r, c);
        if self.conj {
            v.conj()
        } else {
            v
        }
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Dense kernel operand.
pub(crate) enum DenseOperand<'a, T> {
    View(MatrixRef<'a, T>),
    Temp(Derived<T>),
}

impl<'a, T: KernelScalar> DenseOperand<'a, T> {
    fn view(&self) -> Result<MatrixRef<'_, T>> {
        match self {
            DenseOperand::View(v) => Ok(*v),
            DenseOperand::Temp(d) => d.view(),
        }
    }

    fn at(&self, i: usize, j: usize) -> T {
        match self {
            DenseOperand::View(v) => v.get(i, j),
            DenseOperand::Temp(d) => d.at(i, j),
        }
    }
}

/// Dense or sparse product operand.
pub(crate) enum ProductOperand<'a, T> {
    Dense(DenseOperand<'a, T>),
    Sparse(SparseRef<'a, T>),
}

impl<'a, T: KernelScalar> ProductOperand<'a, T> {
    fn at(&self, i: usize, j: usize) -> T {
        match self {
            ProductOperand::Dense(d) => d.at(i, j),
            ProductOperand::Sparse(s) => s.get(i, j),
        }
    }

    fn rows(&self) -> Result<usize> {
        Ok(match self {
            ProductOperand::Dense(d) => d.view()?.rows(),
            ProductOperand::Sparse(s) => s.rows(),
        })
    }

    fn cols(&self) -> Result<usize> {
        Ok(match self {
            ProductOperand::Dense(d) => d.view()?.cols(),
            ProductOperand::Sparse(s) => s.cols(),
        })
    }

    fn with_kernel_operand<R>(&self, f: impl FnOnce(&Operand<'_, T>) -> Result<R>) -> Result<R> {
        match self {
            ProductOperand::Dense(d) => f(&Operand::Dense(d.view()?)),
            ProductOperand::Sparse(s) => f(&Operand::Sparse(*s)),
        }
    }
}

/// Lowered expression: only leaves, temporaries and kernel-shaped nodes.
pub(crate) enum Plan<'a, T> {
    Dense(DenseOperand<'a, T>),
    Sparse(SparseRef<'a, T>),
    Add(Box<Plan<'a, T>>, Box<Plan<'a, T>>),
    Sub(Box<Plan<'a, T>>, Box<Plan<'a, T>>),
    Scale(T, Box<Plan<'a, T>>),
    Hadamard(DenseOperand<'a, T>, DenseOperand<'a, T>),
    Product(ProductOperand<'a, T>, ProductOperand<'a, T>),
}

impl<'a, T: KernelScalar> Plan<'a, T> {
    /// Number of temporaries owned by the plan.
    pub(crate) fn temporaries(&self) -> usize {
        fn dense<T>(d: &DenseOperand<'_, T>) -> usize {
            matches!(d, DenseOperand::Temp(_)) as usize
        }
        fn product<T>(p: &ProductOperand<'_, T>) -> usize {
            match p {
                ProductOperand::Dense(d) => dense(d),
                ProductOperand::Sparse(_) => 0,
            }
        }
        match self {
            Plan::Dense(d) => dense(d),
            Plan::Sparse(_) => 0,
            Plan::Add(l, r) | Plan::Sub(l, r) => l.temporaries() + r.temporaries(),
            Plan::Scale(_, x) => x.temporaries(),
            Plan::Hadamard(a, b) => dense(a) + dense(b),
            Plan::Product(a, b) => product(a) + product(b),
        }
    }

    /// Element `(i, j)` of the plan.
    pub(crate) fn at(&self, i: usize, j: usize) -> Result<T> {
        Ok(match self {
            Plan::Dense(d) => d.at(i, j),
            Plan::Sparse(s) => s.get(i, j),
            Plan::Add(l, r) => l.at(i, j)? + r.at(i, j)?,
            Plan::Sub(l, r) => l.at(i, j)? - r.at(i, j)?,
            Plan::Scale(s, x) => *s * x.at(i, j)?,
            Plan::Hadamard(a, b) => a.at(i, j) * b.at(i, j),
            // fused passes see products only as temporaries (see `hoist_products`)
            Plan::Product(a, b) => {
                let mut acc = T::zero();
                for p in 0..a.cols()? {
                    acc = acc + a.at(i, p) * b.at(p, j);
                }
                acc
            }
        })
    }
}

// ============================================================================
// Lowering
// ============================================================================

pub(crate) fn lower<'a, T: KernelScalar>(expr: &Expr<'a, T>, cfg: &EvalConfig) -> Result<Plan<'a, T>> {
    Ok(match expr.node() {
        Node::Dense(v) => Plan::Dense(DenseOperand::View(*v)),
        Node::Sparse(v) => Plan::Sparse(*v),
        Node::Target(_) => return Err(LinalgError::ForeignTarget),
        Node::Invalid(e) => return Err(e.clone()),
        Node::Add(l, r) => Plan::Add(Box::new(lower(l, cfg)?), Box::new(lower(r, cfg)?)),
        Node::Sub(l, r) => Plan::Sub(Box::new(lower(l, cfg)?), Box::new(lower(r, cfg)?)),
        Node::Neg(x) => Plan::Scale(-T::one(), Box::new(lower(x, cfg)?)),
        Node::Scale(s, x) => Plan::Scale(*s, Box::new(lower(x, cfg)?)),
        Node::Hadamard(l, r) => Plan::Hadamard(dense_operand(l, cfg)?, dense_operand(r, cfg)?),
        Node::Product(l, r) => Plan::Product(product_operand(l, cfg)?, product_operand(r, cfg)?),
        Node::Transpose(x) => Plan::Dense(DenseOperand::Temp(derived(x, cfg)?.transpose())),
        Node::Conj(x) => Plan::Dense(DenseOperand::Temp(derived(x, cfg)?.conj())),
        Node::Submatrix { inner, row, col } => Plan::Dense(DenseOperand::Temp(derived(inner, cfg)?.window(
            *row,
            *col,
            expr.rows(),
            expr.cols(),
        ))),
        Node::Cast(src) => Plan::Dense(DenseOperand::Temp(Derived::new(
            src.materialize(Layout::RowMajor, cfg)?,
        ))),
    })
}

fn dense_operand<'a, T: KernelScalar>(expr: &Expr<'a, T>, cfg: &EvalConfig) -> Result<DenseOperand<'a, T>> {
    match expr.node() {
        Node::Dense(v) => Ok(DenseOperand::View(*v)),
        _ => Ok(DenseOperand::Temp(derived(expr, cfg)?)),
    }
}

fn product_operand<'a, T: KernelScalar>(expr: &Expr<'a, T>, cfg: &EvalConfig) -> Result<ProductOperand<'a, T>> {
    match expr.node() {
        Node::Sparse(v) => Ok(ProductOperand::Sparse(*v)),
        _ => Ok(ProductOperand::Dense(dense_operand(expr, cfg)?)),
    }
}

/// Materialize `expr`, reusing a temporary that lowering already produced.
fn derived<T: KernelScalar>(expr: &Expr<'_, T>, cfg: &EvalConfig) -> Result<Derived<T>> {
    match lower(expr, cfg)? {
        Plan::Dense(DenseOperand::Temp(d)) => Ok(d),
        plan => Ok(Derived::new(run_into_new(&plan, expr.shape(), Layout::RowMajor, cfg)?)),
    }
}

fn run_into_new<T: KernelScalar>(
    plan: &Plan<'_, T>,
    shape: (usize, usize),
    layout: Layout,
    cfg: &EvalConfig,
) -> Result<DenseMatrix<T>> {
    let mut out = DenseMatrix::try_zeros(shape.0, shape.1, layout)?;
    debug!(rows = shape.0, cols = shape.1, ?layout, "materialized temporary");
    exec(plan, T::one(), &mut out.view_mut()?, Mode::Set, cfg)?;
    Ok(out)
}

/// Evaluate `expr` into a new general matrix with the given layout.
pub(crate) fn materialize<T: KernelScalar>(expr: &Expr<'_, T>, layout: Layout, cfg: &EvalConfig) -> Result<DenseMatrix<T>> {
    match lower(expr, cfg)? {
        Plan::Dense(DenseOperand::Temp(d)) if d.is_whole() && d.matrix.layout() == layout => Ok(d.matrix),
        plan => run_into_new(&plan, expr.shape(), layout, cfg),
    }
}

// ============================================================================
// Execution
// ============================================================================

/// `dest op= alpha * plan`, running one kernel per leaf or kernel node.
///
/// The destination must not overlap any leaf of the plan.
pub(crate) fn exec<T: KernelScalar>(
    plan: &Plan<'_, T>,
    alpha: T,
    dest: &mut MatrixMut<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<()> {
    match plan {
        Plan::Dense(d) => {
            dispatch::scaled_copy(dest, alpha, &d.view()?, mode, cfg)?;
        }
        Plan::Sparse(s) => {
            dispatch::sparse_accumulate(dest, alpha, s, mode, cfg)?;
        }
        Plan::Add(l, r) => {
            exec(l, alpha, dest, mode, cfg)?;
            exec(r, alpha, dest, mode.then(), cfg)?;
        }
        Plan::Sub(l, r) => {
            exec(l, alpha, dest, mode, cfg)?;
            exec(r, -alpha, dest, mode.then(), cfg)?;
        }
        Plan::Scale(s, x) => exec(x, alpha * *s, dest, mode, cfg)?,
        Plan::Hadamard(a, b) => {
            dispatch::hadamard(dest, alpha, &a.view()?, &b.view()?, mode, cfg)?;
        }
        Plan::Product(a, b) => {
            a.with_kernel_operand(|a| b.with_kernel_operand(|b| dispatch::gemm(dest, alpha, a, b, mode, cfg)))?;
        }
    }
    Ok(())
}

/// Run every product of `plan` through [`dispatch::gemm`] into a temporary,
/// leaving a purely element-wise plan for [`exec_fused`].
///
/// Product operands must not overlap the destination of the fused pass.
pub(crate) fn hoist_products<'a, T: KernelScalar>(plan: Plan<'a, T>, cfg: &EvalConfig) -> Result<Plan<'a, T>> {
    Ok(match plan {
        Plan::Product(a, b) => {
            let shape = (a.rows()?, b.cols()?);
            let product = Plan::Product(a, b);
            let m = run_into_new(&product, shape, Layout::RowMajor, cfg)?;
            Plan::Dense(DenseOperand::Temp(Derived::new(m)))
        }
        Plan::Add(l, r) => Plan::Add(Box::new(hoist_products(*l, cfg)?), Box::new(hoist_products(*r, cfg)?)),
        Plan::Sub(l, r) => Plan::Sub(Box::new(hoist_products(*l, cfg)?), Box::new(hoist_products(*r, cfg)?)),
        Plan::Scale(s, x) => Plan::Scale(s, Box::new(hoist_products(*x, cfg)?)),
        plan @ (Plan::Dense(_) | Plan::Sparse(_) | Plan::Hadamard(..)) => plan,
    })
}

/// Single pass `dest(i, j) op= plan(i, j)`.
///
/// Each element of the plan is read before the destination element at the
/// same position is written, so leaves that map exactly onto the destination
/// are allowed. Products should be hoisted first.
pub(crate) fn exec_fused<T: KernelScalar>(plan: &Plan<'_, T>, dest: &mut MatrixMut<'_, T>, mode: Mode) -> Result<()> {
    let (rows, cols) = dest.shape();
    for i in 0..rows {
        for j in 0..cols {
            let v = plan.at(i, j)?;
            let d = dest.get(i, j);
            dest.set(i, j, mode.combine(d, v));
        }
    }
    Ok(())
}
