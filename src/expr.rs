//! Lazy expression trees.
//!
//! Composing containers never computes anything: `&a + &b * &c` builds an
//! [`Expr`] whose leaves borrow the containers. Work happens when the tree is
//! assigned (see [`crate::Assign`]), evaluated ([`Expr::evaluate`]) or
//! queried element by element ([`Expr::at`]).
//!
//! Unary operations on a leaf collapse into a re-indexed view, so
//! `a.expr().transpose().row(2)` is still a single leaf and never copies.
//!
//! A composition with incompatible shapes yields an invalid expression that
//! carries the [`LinalgError`]. Further composition keeps the first error and
//! every consumer reports it before touching a destination. The fallible
//! builders ([`Expr::try_add`] and friends) surface it immediately.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use lazymat_kernel::{EvalConfig, KernelScalar};
use lazymat_storage::{
    DenseMatrix, ElementOpApply, Layout, LinalgError, MatrixRef, Orientation, Result, SparseRef,
};
use num_complex::Complex;
use num_traits::Zero;

use crate::alias::Leaves;
use crate::operand::IntoExpr;

// ============================================================================
// Node kinds
// ============================================================================

/// Operator at the root of an [`Expr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Dense view (possibly transposed, conjugated or windowed).
    Dense,
    /// Sparse view.
    Sparse,
    /// The destination of the enclosing assignment.
    Target,
    Add,
    Sub,
    Neg,
    /// Scalar times expression.
    Scale,
    /// Element-wise product.
    Hadamard,
    /// Matrix product.
    Product,
    Transpose,
    Conj,
    Submatrix,
    /// Element-type conversion.
    Cast,
    /// Composition failed; see [`Expr::error`].
    Invalid,
}

/// Binary composition, after `*` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Hadamard,
    Product,
    /// `*`: element-wise for two vectors of the same orientation, matrix
    /// product otherwise.
    Mul,
}

fn vector_orientation(shape: (usize, usize)) -> Option<Orientation> {
    match shape {
        (n, 1) if n > 1 => Some(Orientation::Column),
        (1, n) if n > 1 => Some(Orientation::Row),
        _ => None,
    }
}

impl BinaryOp {
    /// Resolve `Mul` and compute the result shape.
    fn resolve(self, lhs: (usize, usize), rhs: (usize, usize)) -> Result<(BinaryOp, (usize, usize))> {
        let op = match self {
            BinaryOp::Mul => match (vector_orientation(lhs), vector_orientation(rhs)) {
                (Some(a), Some(b)) if a == b => BinaryOp::Hadamard,
                _ => BinaryOp::Product,
            },
            op => op,
        };
        let shape = match op {
            BinaryOp::Product if lhs.1 == rhs.0 => (lhs.0, rhs.1),
            BinaryOp::Product => return Err(LinalgError::ShapeMismatch(lhs, rhs)),
            _ if lhs == rhs => lhs,
            _ => return Err(LinalgError::ShapeMismatch(lhs, rhs)),
        };
        Ok((op, shape))
    }
}

pub(crate) enum Node<'a, T> {
    Dense(MatrixRef<'a, T>),
    Sparse(SparseRef<'a, T>),
    Target(u64),
    Add(Box<Expr<'a, T>>, Box<Expr<'a, T>>),
    Sub(Box<Expr<'a, T>>, Box<Expr<'a, T>>),
    Neg(Box<Expr<'a, T>>),
    Scale(T, Box<Expr<'a, T>>),
    Hadamard(Box<Expr<'a, T>>, Box<Expr<'a, T>>),
    Product(Box<Expr<'a, T>>, Box<Expr<'a, T>>),
    Transpose(Box<Expr<'a, T>>),
    Conj(Box<Expr<'a, T>>),
    /// Window starting at `(row, col)`; the extent is the node shape.
    Submatrix {
        inner: Box<Expr<'a, T>>,
        row: usize,
        col: usize,
    },
    Cast(Rc<dyn CastSource<T> + 'a>),
    Invalid(LinalgError),
}

impl<T: Copy> Clone for Node<'_, T> {
    fn clone(&self) -> Self {
        match self {
            Node::Dense(v) => Node::Dense(*v),
            Node::Sparse(v) => Node::Sparse(*v),
            Node::Target(id) => Node::Target(*id),
            Node::Add(l, r) => Node::Add(l.clone(), r.clone()),
            Node::Sub(l, r) => Node::Sub(l.clone(), r.clone()),
            Node::Neg(x) => Node::Neg(x.clone()),
            Node::Scale(s, x) => Node::Scale(*s, x.clone()),
            Node::Hadamard(l, r) => Node::Hadamard(l.clone(), r.clone()),
            Node::Product(l, r) => Node::Product(l.clone(), r.clone()),
            Node::Transpose(x) => Node::Transpose(x.clone()),
            Node::Conj(x) => Node::Conj(x.clone()),
            Node::Submatrix { inner, row, col } => Node::Submatrix {
                inner: inner.clone(),
                row: *row,
                col: *col,
            },
            Node::Cast(src) => Node::Cast(Rc::clone(src)),
            Node::Invalid(e) => Node::Invalid(e.clone()),
        }
    }
}

// ============================================================================
// Expr
// ============================================================================

/// Unevaluated matrix expression borrowing its operands for `'a`.
pub struct Expr<'a, T> {
    node: Node<'a, T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Clone for Expr<'_, T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Expr<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Dense(v) => write!(f, "{v:?}"),
            Node::Sparse(v) => write!(f, "{v:?}"),
            Node::Target(id) => write!(f, "Target#{id}"),
            Node::Add(l, r) => write!(f, "({l:?} + {r:?})"),
            Node::Sub(l, r) => write!(f, "({l:?} - {r:?})"),
            Node::Neg(x) => write!(f, "-{x:?}"),
            Node::Scale(s, x) => write!(f, "{s:?} * {x:?}"),
            Node::Hadamard(l, r) => write!(f, "({l:?} .* {r:?})"),
            Node::Product(l, r) => write!(f, "({l:?} * {r:?})"),
            Node::Transpose(x) => write!(f, "{x:?}^T"),
            Node::Conj(x) => write!(f, "conj({x:?})"),
            Node::Submatrix { inner, row, col } => {
                write!(f, "{inner:?}[{row}.., {col}..; {}x{}]", self.rows, self.cols)
            }
            Node::Cast(src) => write!(f, "cast({src:?})"),
            Node::Invalid(e) => write!(f, "<invalid: {e}>"),
        }
    }
}

impl<'a, T> Expr<'a, T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn kind(&self) -> ExprKind {
        match &self.node {
            Node::Dense(_) => ExprKind::Dense,
            Node::Sparse(_) => ExprKind::Sparse,
            Node::Target(_) => ExprKind::Target,
            Node::Add(..) => ExprKind::Add,
            Node::Sub(..) => ExprKind::Sub,
            Node::Neg(_) => ExprKind::Neg,
            Node::Scale(..) => ExprKind::Scale,
            Node::Hadamard(..) => ExprKind::Hadamard,
            Node::Product(..) => ExprKind::Product,
            Node::Transpose(_) => ExprKind::Transpose,
            Node::Conj(_) => ExprKind::Conj,
            Node::Submatrix { .. } => ExprKind::Submatrix,
            Node::Cast(_) => ExprKind::Cast,
            Node::Invalid(_) => ExprKind::Invalid,
        }
    }

    /// The composition error, if this expression is invalid.
    pub fn error(&self) -> Option<&LinalgError> {
        match &self.node {
            Node::Invalid(e) => Some(e),
            _ => None,
        }
    }

    /// `Err` with the composition error of an invalid expression.
    pub fn validate(&self) -> Result<()> {
        match &self.node {
            Node::Invalid(e) => Err(e.clone()),
            _ => Ok(()),
        }
    }

    pub(crate) fn node(&self) -> &Node<'a, T> {
        &self.node
    }

    fn invalid(err: LinalgError, shape: (usize, usize)) -> Self {
        Self {
            node: Node::Invalid(err),
            rows: shape.0,
            cols: shape.1,
        }
    }

    fn with_shape(node: Node<'a, T>, shape: (usize, usize)) -> Self {
        Self {
            node,
            rows: shape.0,
            cols: shape.1,
        }
    }

    /// Whether an unbound destination handle occurs anywhere in the tree.
    pub(crate) fn contains_target(&self) -> bool {
        match &self.node {
            Node::Target(_) => true,
            Node::Dense(_) | Node::Sparse(_) | Node::Invalid(_) => false,
            Node::Add(l, r) | Node::Sub(l, r) | Node::Hadamard(l, r) | Node::Product(l, r) => {
                l.contains_target() || r.contains_target()
            }
            Node::Neg(x) | Node::Scale(_, x) | Node::Transpose(x) | Node::Conj(x) => x.contains_target(),
            Node::Submatrix { inner, .. } => inner.contains_target(),
            Node::Cast(src) => src.has_target(),
        }
    }
}

impl<'a, T: KernelScalar> Expr<'a, T> {
    /// Leaf over a dense view.
    pub fn dense(view: MatrixRef<'a, T>) -> Self {
        let shape = view.shape();
        Self::with_shape(Node::Dense(view), shape)
    }

    /// Leaf over a sparse view.
    pub fn sparse(view: SparseRef<'a, T>) -> Self {
        let shape = view.shape();
        Self::with_shape(Node::Sparse(view), shape)
    }

    pub(crate) fn target(id: u64, shape: (usize, usize)) -> Self {
        Self::with_shape(Node::Target(id), shape)
    }

    // ------------------------------------------------------------------------
    // Binary composition
    // ------------------------------------------------------------------------

    pub(crate) fn combine(self, rhs: Self, op: BinaryOp) -> Self {
        if self.error().is_some() {
            return self;
        }
        if rhs.error().is_some() {
            return rhs;
        }
        let (op, shape) = match op.resolve(self.shape(), rhs.shape()) {
            Ok(resolved) => resolved,
            Err(e) => return Self::invalid(e, self.shape()),
        };
        let (l, r) = (Box::new(self), Box::new(rhs));
        let node = match op {
            BinaryOp::Add => Node::Add(l, r),
            BinaryOp::Sub => Node::Sub(l, r),
            BinaryOp::Hadamard => Node::Hadamard(l, r),
            BinaryOp::Product | BinaryOp::Mul => Node::Product(l, r),
        };
        Self::with_shape(node, shape)
    }

    fn into_result(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn try_add(self, rhs: impl IntoExpr<'a, T>) -> Result<Self> {
        self.combine(rhs.into_expr(), BinaryOp::Add).into_result()
    }

    pub fn try_sub(self, rhs: impl IntoExpr<'a, T>) -> Result<Self> {
        self.combine(rhs.into_expr(), BinaryOp::Sub).into_result()
    }

    /// `self * rhs` with shape inference, see [`Mul`](std::ops::Mul).
    pub fn try_mul(self, rhs: impl IntoExpr<'a, T>) -> Result<Self> {
        self.combine(rhs.into_expr(), BinaryOp::Mul).into_result()
    }

    /// Matrix product regardless of operand shapes.
    pub fn try_matmul(self, rhs: impl IntoExpr<'a, T>) -> Result<Self> {
        self.combine(rhs.into_expr(), BinaryOp::Product).into_result()
    }

    /// Element-wise product; shapes must be equal.
    pub fn hadamard(self, rhs: impl IntoExpr<'a, T>) -> Self {
        self.combine(rhs.into_expr(), BinaryOp::Hadamard)
    }

    // ------------------------------------------------------------------------
    // Unary composition
    // ------------------------------------------------------------------------

    /// `s * self`. Nested scales fold into one.
    pub fn scale(self, s: T) -> Self {
        let shape = self.shape();
        match self.node {
            Node::Invalid(_) => self,
            Node::Scale(t, inner) => Self::with_shape(Node::Scale(s * t, inner), shape),
            Node::Neg(inner) => Self::with_shape(Node::Scale(-s, inner), shape),
            node => Self::with_shape(Node::Scale(s, Box::new(Self::with_shape(node, shape))), shape),
        }
    }

    pub(crate) fn negate(self) -> Self {
        let shape = self.shape();
        match self.node {
            Node::Invalid(_) => self,
            Node::Neg(inner) => *inner,
            Node::Scale(s, inner) => Self::with_shape(Node::Scale(-s, inner), shape),
            node => Self::with_shape(Node::Neg(Box::new(Self::with_shape(node, shape))), shape),
        }
    }

    pub fn transpose(self) -> Self {
        let shape = (self.cols, self.rows);
        match self.node {
            Node::Invalid(_) => Self { rows: shape.0, cols: shape.1, ..self },
            Node::Dense(v) => Self::dense(v.transpose()),
            Node::Sparse(v) => Self::sparse(v.transpose()),
            Node::Transpose(inner) => *inner,
            node => {
                let inner = Self::with_shape(node, (shape.1, shape.0));
                Self::with_shape(Node::Transpose(Box::new(inner)), shape)
            }
        }
    }

    /// Element-wise complex conjugate; the identity for real elements.
    pub fn conj(self) -> Self {
        let shape = self.shape();
        match self.node {
            Node::Invalid(_) => self,
            Node::Dense(v) => Self::dense(v.conj()),
            Node::Sparse(v) => Self::sparse(v.conj()),
            Node::Conj(inner) => *inner,
            node => Self::with_shape(Node::Conj(Box::new(Self::with_shape(node, shape))), shape),
        }
    }

    /// Conjugate transpose.
    pub fn adjoint(self) -> Self {
        self.transpose().conj()
    }

    /// `rows x cols` window starting at `(row, col)`.
    pub fn submatrix(self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        if self.error().is_some() {
            return self;
        }
        let fits = row
            .checked_add(rows)
            .zip(col.checked_add(cols))
            .is_some_and(|(r, c)| r <= self.rows && c <= self.cols);
        if !fits {
            return Self::invalid(
                LinalgError::IndexOutOfRange {
                    index: (row.saturating_add(rows), col.saturating_add(cols)),
                    shape: self.shape(),
                },
                self.shape(),
            );
        }
        let shape = (rows, cols);
        match self.node {
            Node::Dense(v) => match v.submatrix(row, col, rows, cols) {
                Ok(w) => Self::dense(w),
                Err(e) => Self::invalid(e, shape),
            },
            Node::Sparse(v) => match v.submatrix(row, col, rows, cols) {
                Ok(w) => Self::sparse(w),
                Err(e) => Self::invalid(e, shape),
            },
            Node::Submatrix { inner, row: r0, col: c0 } => Self::with_shape(
                Node::Submatrix {
                    inner,
                    row: r0 + row,
                    col: c0 + col,
                },
                shape,
            ),
            node => {
                let inner = Box::new(Self::with_shape(node, (self.rows, self.cols)));
                Self::with_shape(Node::Submatrix { inner, row, col }, shape)
            }
        }
    }

    /// Row `i` as a `1 x cols` expression.
    pub fn row(self, i: usize) -> Self {
        let cols = self.cols;
        self.submatrix(i, 0, 1, cols)
    }

    /// Column `j` as a `rows x 1` expression.
    pub fn column(self, j: usize) -> Self {
        let rows = self.rows;
        self.submatrix(0, j, rows, 1)
    }

    /// Convert every element with `U::from`.
    pub fn cast<U>(self) -> Expr<'a, U>
    where
        U: KernelScalar + From<T>,
    {
        let shape = self.shape();
        match self.node {
            Node::Invalid(e) => Expr::invalid(e, shape),
            _ => Expr::with_shape(Node::Cast(Rc::new(CastExpr { inner: self })), shape),
        }
    }

    // ------------------------------------------------------------------------
    // Target binding
    // ------------------------------------------------------------------------

    /// Replace the destination handle `id` with `with`.
    ///
    /// Rebuilding goes through the smart constructors, so a bound target that
    /// is a view collapses just like any other leaf.
    pub(crate) fn bind_target<'b>(self, id: u64, with: &Expr<'b, T>) -> Result<Expr<'b, T>>
    where
        'a: 'b,
    {
        let shape = self.shape();
        Ok(match self.node {
            Node::Dense(v) => Expr::dense(v),
            Node::Sparse(v) => Expr::sparse(v),
            Node::Target(t) if t == id => with.clone(),
            Node::Target(_) => return Err(LinalgError::ForeignTarget),
            Node::Add(l, r) => l.bind_target(id, with)?.combine(r.bind_target(id, with)?, BinaryOp::Add),
            Node::Sub(l, r) => l.bind_target(id, with)?.combine(r.bind_target(id, with)?, BinaryOp::Sub),
            Node::Hadamard(l, r) => {
                l.bind_target(id, with)?.combine(r.bind_target(id, with)?, BinaryOp::Hadamard)
            }
            Node::Product(l, r) => {
                l.bind_target(id, with)?.combine(r.bind_target(id, with)?, BinaryOp::Product)
            }
            Node::Neg(x) => x.bind_target(id, with)?.negate(),
            Node::Scale(s, x) => x.bind_target(id, with)?.scale(s),
            Node::Transpose(x) => x.bind_target(id, with)?.transpose(),
            Node::Conj(x) => x.bind_target(id, with)?.conj(),
            Node::Submatrix { inner, row, col } => {
                inner.bind_target(id, with)?.submatrix(row, col, shape.0, shape.1)
            }
            Node::Cast(src) if src.has_target() => return Err(LinalgError::ForeignTarget),
            Node::Cast(src) => Expr::with_shape(Node::Cast(src), shape),
            Node::Invalid(e) => return Err(e),
        })
    }

    // ------------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------------

    /// Evaluate the single element `(i, j)` without materializing anything.
    ///
    /// A product costs one inner product per call.
    pub fn at(&self, i: usize, j: usize) -> Result<T> {
        if i >= self.rows || j >= self.cols {
            self.validate()?;
            return Err(LinalgError::IndexOutOfRange {
                index: (i, j),
                shape: self.shape(),
            });
        }
        Ok(match &self.node {
            Node::Dense(v) => v.get(i, j),
            Node::Sparse(v) => v.get(i, j),
            Node::Target(_) => return Err(LinalgError::ForeignTarget),
            Node::Add(l, r) => l.at(i, j)? + r.at(i, j)?,
            Node::Sub(l, r) => l.at(i, j)? - r.at(i, j)?,
            Node::Neg(x) => -x.at(i, j)?,
            Node::Scale(s, x) => *s * x.at(i, j)?,
            Node::Hadamard(l, r) => l.at(i, j)? * r.at(i, j)?,
            Node::Product(l, r) => {
                let mut acc = T::zero();
                for p in 0..l.cols {
                    acc = acc + l.at(i, p)? * r.at(p, j)?;
                }
                acc
            }
            Node::Transpose(x) => x.at(j, i)?,
            Node::Conj(x) => x.at(i, j)?.conj(),
            Node::Submatrix { inner, row, col } => inner.at(row + i, col + j)?,
            Node::Cast(src) => src.at(i, j)?,
            Node::Invalid(e) => return Err(e.clone()),
        })
    }

    /// Evaluate into a new row-major matrix using the global configuration.
    pub fn evaluate(&self) -> Result<DenseMatrix<T>> {
        self.evaluate_with(EvalConfig::global())
    }

    pub fn evaluate_with(&self, cfg: &EvalConfig) -> Result<DenseMatrix<T>> {
        crate::eval::materialize(self, Layout::RowMajor, cfg)
    }

    /// Run `f` on a dense view of this expression, materializing it first
    /// unless it is already a dense leaf.
    fn with_view<R>(&self, cfg: &EvalConfig, f: impl FnOnce(&MatrixRef<'_, T>) -> R) -> Result<R> {
        match &self.node {
            Node::Dense(v) => Ok(f(v)),
            _ => {
                let m = crate::eval::materialize(self, Layout::RowMajor, cfg)?;
                Ok(f(&m.view()))
            }
        }
    }

    /// Sum of all elements.
    pub fn sum(&self) -> Result<T> {
        self.sum_with(EvalConfig::global())
    }

    pub fn sum_with(&self, cfg: &EvalConfig) -> Result<T> {
        self.validate()?;
        if let Node::Sparse(v) = &self.node {
            let mut acc = T::zero();
            v.for_each(|_, _, x| acc = acc + x);
            return Ok(acc);
        }
        self.with_view(cfg, |v| lazymat_kernel::sum(v, cfg))
    }

    /// `sum(self[i][j] * rhs[i][j])` over equal shapes, without conjugation.
    pub fn dot(&self, rhs: impl IntoExpr<'a, T>) -> Result<T> {
        self.dot_with(rhs, EvalConfig::global())
    }

    pub fn dot_with(&self, rhs: impl IntoExpr<'a, T>, cfg: &EvalConfig) -> Result<T> {
        let rhs = rhs.into_expr();
        self.validate()?;
        rhs.validate()?;
        if self.shape() != rhs.shape() {
            return Err(LinalgError::ShapeMismatch(self.shape(), rhs.shape()));
        }
        self.with_view(cfg, |a| rhs.with_view(cfg, |b| lazymat_kernel::dot(a, b, cfg)))??
    }
}

impl<'a, R> Expr<'a, Complex<R>>
where
    Complex<R>: KernelScalar,
    R: Clone + Zero,
{
    /// Scale a complex expression by a real factor.
    pub fn scale_real(self, s: R) -> Self {
        self.scale(Complex::new(s, R::zero()))
    }
}

// ============================================================================
// Cast
// ============================================================================

/// Type-erased source of a cast node.
///
/// The inner expression has a different element type, so it is reached
/// through this object instead of a `Node` variant.
pub(crate) trait CastSource<T>: fmt::Debug {
    fn at(&self, i: usize, j: usize) -> Result<T>;
    fn materialize(&self, layout: Layout, cfg: &EvalConfig) -> Result<DenseMatrix<T>>;
    /// Buffers read by the inner expression.
    fn collect_leaves(&self, out: &mut Leaves);
    fn has_target(&self) -> bool;
}

struct CastExpr<'a, U> {
    inner: Expr<'a, U>,
}

impl<U: fmt::Debug> fmt::Debug for CastExpr<'_, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} as {}", self.inner, std::any::type_name::<U>())
    }
}

impl<U, T> CastSource<T> for CastExpr<'_, U>
where
    U: KernelScalar,
    T: KernelScalar + From<U>,
{
    fn at(&self, i: usize, j: usize) -> Result<T> {
        self.inner.at(i, j).map(T::from)
    }

    fn materialize(&self, layout: Layout, cfg: &EvalConfig) -> Result<DenseMatrix<T>> {
        Ok(crate::eval::materialize(&self.inner, layout, cfg)?.map(T::from))
    }

    fn collect_leaves(&self, out: &mut Leaves) {
        crate::alias::collect(&self.inner, false, out);
    }

    fn has_target(&self) -> bool {
        self.inner.contains_target()
    }
}

// ============================================================================
// Target
// ============================================================================

static NEXT_TARGET: AtomicU64 = AtomicU64::new(1);

/// Handle to the destination of an assignment.
///
/// Passed to the closure of [`Assign::assign_with`](crate::Assign::assign_with)
/// so the right-hand side can read the destination. Using a handle in any
/// other assignment fails with [`LinalgError::ForeignTarget`].
pub struct Target<'a, T> {
    id: u64,
    rows: usize,
    cols: usize,
    _marker: PhantomData<(&'a (), fn() -> T)>,
}

impl<T> Clone for Target<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Target<'_, T> {}

impl<T> fmt::Debug for Target<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("id", &self.id)
            .field("shape", &(self.rows, self.cols))
            .finish()
    }
}

impl<'a, T> Target<'a, T> {
    pub(crate) fn new(shape: (usize, usize)) -> Self {
        Self {
            id: NEXT_TARGET.fetch_add(1, Ordering::Relaxed),
            rows: shape.0,
            cols: shape.1,
            _marker: PhantomData,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Shape of the destination before the assignment.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }
}

impl<'a, T: KernelScalar> Target<'a, T> {
    pub fn expr(self) -> Expr<'a, T> {
        Expr::target(self.id, self.shape())
    }

    pub fn transpose(self) -> Expr<'a, T> {
        self.expr().transpose()
    }

    pub fn conj(self) -> Expr<'a, T> {
        self.expr().conj()
    }

    pub fn adjoint(self) -> Expr<'a, T> {
        self.expr().adjoint()
    }

    pub fn scale(self, s: T) -> Expr<'a, T> {
        self.expr().scale(s)
    }
}
