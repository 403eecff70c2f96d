//! Compressed sparse matrices and vectors.
//!
//! A [`SparseMatrix`] keeps one line per row (row-major) or per column
//! (column-major). Each line holds strictly increasing indices and the
//! matching values in two parallel vectors, so lookups are binary searches
//! and iteration is in ascending index order. Sparse storage is always
//! [`StructuralForm::General`](lazymat_traits::StructuralForm::General).

use lazymat_traits::{Descriptor, ElementOp, Layout, Scalar};

use crate::dense::DenseMatrix;
use crate::span::{BufferSpan, ReadKey};
use crate::vector::Orientation;
use crate::view::MatrixRef;
use crate::{check_index, LinalgError, Result};

// ============================================================================
// Line
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Line<T> {
    indices: Vec<usize>,
    values: Vec<T>,
}

impl<T> Default for Line<T> {
    fn default() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Copy> Line<T> {
    #[inline]
    fn find(&self, idx: usize) -> Option<T> {
        self.indices
            .binary_search(&idx)
            .ok()
            .map(|k| self.values[k])
    }

    /// Insert a new entry; `false` if `idx` is already present.
    fn insert(&mut self, idx: usize, value: T) -> bool {
        match self.indices.binary_search(&idx) {
            Ok(_) => false,
            Err(k) => {
                self.indices.insert(k, idx);
                self.values.insert(k, value);
                true
            }
        }
    }

    /// Insert or overwrite, returning the previous value.
    fn set(&mut self, idx: usize, value: T) -> Option<T> {
        match self.indices.binary_search(&idx) {
            Ok(k) => Some(std::mem::replace(&mut self.values[k], value)),
            Err(k) => {
                self.indices.insert(k, idx);
                self.values.insert(k, value);
                None
            }
        }
    }

    fn erase(&mut self, idx: usize) -> Option<T> {
        let k = self.indices.binary_search(&idx).ok()?;
        self.indices.remove(k);
        Some(self.values.remove(k))
    }

    /// Drop entries with index `>= bound`.
    fn truncate(&mut self, bound: usize) {
        let keep = self.indices.partition_point(|&i| i < bound);
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        let elements = self.indices.len().saturating_add(additional);
        let fail = |_| LinalgError::AllocationFailure { elements };
        self.indices.try_reserve(additional).map_err(fail)?;
        self.values.try_reserve(additional).map_err(fail)
    }

    fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Entries with index in `[lo, hi)`.
    fn range(&self, lo: usize, hi: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let start = self.indices.partition_point(|&i| i < lo);
        let end = self.indices.partition_point(|&i| i < hi);
        self.indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }
}

// ============================================================================
// SparseMatrix
// ============================================================================

/// Compressed sparse matrix, row-major (CSR-like) or column-major (CSC-like).
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    rows: usize,
    cols: usize,
    layout: Layout,
    lines: Vec<Line<T>>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Empty row-major `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_layout(rows, cols, Layout::RowMajor)
    }

    pub fn with_layout(rows: usize, cols: usize, layout: Layout) -> Self {
        let n = match layout {
            Layout::RowMajor => rows,
            Layout::ColMajor => cols,
        };
        Self {
            rows,
            cols,
            layout,
            lines: (0..n).map(|_| Line::default()).collect(),
        }
    }

    /// Build from `(row, col, value)` triplets; later triplets overwrite earlier ones.
    pub fn from_triplets(
        rows: usize,
        cols: usize,
        layout: Layout,
        triplets: impl IntoIterator<Item = (usize, usize, T)>,
    ) -> Result<Self> {
        let mut m = Self::with_layout(rows, cols, layout);
        for (i, j, v) in triplets {
            m.set(i, j, v)?;
        }
        Ok(m)
    }

    /// Nonzero elements of a dense view.
    pub fn from_view(src: &MatrixRef<'_, T>, layout: Layout) -> Self {
        let mut m = Self::with_layout(src.rows(), src.cols(), layout);
        let (outer, inner) = match layout {
            Layout::RowMajor => (src.rows(), src.cols()),
            Layout::ColMajor => (src.cols(), src.rows()),
        };
        for k in 0..outer {
            let line = &mut m.lines[k];
            for idx in 0..inner {
                let (i, j) = match layout {
                    Layout::RowMajor => (k, idx),
                    Layout::ColMajor => (idx, k),
                };
                let v = unsafe { src.get_unchecked(i, j) };
                if !v.is_zero() {
                    line.indices.push(idx);
                    line.values.push(v);
                }
            }
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::sparse(self.layout)
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.lines.iter().map(|l| l.indices.len()).sum()
    }

    /// Number of lines: rows for row-major, columns for column-major.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Entry capacity summed over all lines.
    pub fn capacity(&self) -> usize {
        self.lines.iter().map(|l| l.indices.capacity()).sum()
    }

    /// Identity of this container for alias analysis.
    pub fn span(&self) -> BufferSpan {
        BufferSpan::of_value(self)
    }

    #[inline]
    fn locate(&self, i: usize, j: usize) -> (usize, usize) {
        match self.layout {
            Layout::RowMajor => (i, j),
            Layout::ColMajor => (j, i),
        }
    }

    /// Insert a new entry; fails if `(i, j)` is already stored.
    pub fn insert(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        check_index(i, j, self.shape())?;
        let (k, idx) = self.locate(i, j);
        if self.lines[k].insert(idx, value) {
            Ok(())
        } else {
            Err(LinalgError::DuplicateEntry { row: i, col: j })
        }
    }

    /// Insert or overwrite `(i, j)`.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        check_index(i, j, self.shape())?;
        let (k, idx) = self.locate(i, j);
        self.lines[k].set(idx, value);
        Ok(())
    }

    /// Remove `(i, j)`, returning the stored value.
    pub fn erase(&mut self, i: usize, j: usize) -> Option<T> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let (k, idx) = self.locate(i, j);
        self.lines[k].erase(idx)
    }

    /// Stored value at `(i, j)`, if any.
    pub fn find(&self, i: usize, j: usize) -> Option<T> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let (k, idx) = self.locate(i, j);
        self.lines[k].find(idx)
    }

    /// Logical element; zero when not stored.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} sparse matrix",
            self.rows,
            self.cols
        );
        self.find(i, j).unwrap_or_else(T::zero)
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        check_index(i, j, self.shape())?;
        Ok(self.find(i, j).unwrap_or_else(T::zero))
    }

    /// Entries of line `k` as `(index, value)`, ascending by index.
    ///
    /// Each call starts a fresh pass.
    ///
    /// # Panics
    /// Panics if `k >= line_count()`.
    pub fn line(&self, k: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        self.lines[k].iter()
    }

    /// All entries as `(row, col, value)`, line by line.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let layout = self.layout;
        self.lines.iter().enumerate().flat_map(move |(k, line)| {
            line.iter().map(move |(idx, v)| match layout {
                Layout::RowMajor => (k, idx, v),
                Layout::ColMajor => (idx, k, v),
            })
        })
    }

    /// Change the logical shape; entries outside the new bounds are dropped.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        let (n, bound) = match self.layout {
            Layout::RowMajor => (rows, cols),
            Layout::ColMajor => (cols, rows),
        };
        self.lines.resize_with(n, Line::default);
        for line in &mut self.lines {
            line.truncate(bound);
        }
        self.rows = rows;
        self.cols = cols;
    }

    /// Reserve room for `additional` entries in line `k`.
    pub fn reserve_line(&mut self, k: usize, additional: usize) -> Result<()> {
        let shape = self.shape();
        self.lines
            .get_mut(k)
            .ok_or(LinalgError::IndexOutOfRange {
                index: (k, 0),
                shape,
            })?
            .reserve(additional)
    }

    /// Reserve room for `additional` entries spread evenly over all lines.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let n = self.lines.len().max(1);
        let per_line = additional.div_ceil(n);
        for line in &mut self.lines {
            line.reserve(per_line)?;
        }
        Ok(())
    }

    /// Remove all entries, keeping the shape.
    pub fn clear(&mut self) {
        for line in &mut self.lines {
            line.indices.clear();
            line.values.clear();
        }
    }

    pub fn to_dense(&self) -> DenseMatrix<T> {
        let mut out = DenseMatrix::zeros_with_layout(self.rows, self.cols, self.layout);
        if let Some(buf) = out.as_mut_slice() {
            for (i, j, v) in self.iter() {
                buf[self.layout.offset(i, j, self.rows, self.cols)] = v;
            }
        }
        out
    }

    pub fn view(&self) -> SparseRef<'_, T> {
        SparseRef {
            matrix: self,
            transposed: false,
            op: ElementOp::Identity,
            row0: 0,
            col0: 0,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

// ============================================================================
// SparseVector
// ============================================================================

/// Sparse vector; a single-line [`SparseMatrix`] underneath.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector<T> {
    inner: SparseMatrix<T>,
    orientation: Orientation,
}

impl<T: Scalar> SparseVector<T> {
    /// Empty column vector.
    pub fn new(len: usize) -> Self {
        Self::with_orientation(len, Orientation::Column)
    }

    pub fn with_orientation(len: usize, orientation: Orientation) -> Self {
        let inner = match orientation {
            Orientation::Column => SparseMatrix::with_layout(len, 1, Layout::ColMajor),
            Orientation::Row => SparseMatrix::with_layout(1, len, Layout::RowMajor),
        };
        Self { inner, orientation }
    }

    #[inline]
    fn at(&self, i: usize) -> (usize, usize) {
        match self.orientation {
            Orientation::Column => (i, 0),
            Orientation::Row => (0, i),
        }
    }

    pub fn len(&self) -> usize {
        match self.orientation {
            Orientation::Column => self.inner.rows,
            Orientation::Row => self.inner.cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    pub fn nnz(&self) -> usize {
        self.inner.nnz()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn insert(&mut self, i: usize, value: T) -> Result<()> {
        let (r, c) = self.at(i);
        self.inner.insert(r, c, value)
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        let (r, c) = self.at(i);
        self.inner.set(r, c, value)
    }

    pub fn erase(&mut self, i: usize) -> Option<T> {
        let (r, c) = self.at(i);
        self.inner.erase(r, c)
    }

    pub fn find(&self, i: usize) -> Option<T> {
        let (r, c) = self.at(i);
        self.inner.find(r, c)
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize) -> T {
        let (r, c) = self.at(i);
        self.inner.get(r, c)
    }

    pub fn try_get(&self, i: usize) -> Result<T> {
        let (r, c) = self.at(i);
        self.inner.try_get(r, c)
    }

    /// Stored `(index, value)` pairs, ascending; each call restarts.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.inner.lines.iter().flat_map(Line::iter)
    }

    /// Change the length, dropping entries beyond it.
    pub fn resize(&mut self, len: usize) {
        match self.orientation {
            Orientation::Column => self.inner.resize(len, 1),
            Orientation::Row => self.inner.resize(1, len),
        }
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.inner.reserve(additional)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn span(&self) -> BufferSpan {
        self.inner.span()
    }

    pub fn as_matrix(&self) -> &SparseMatrix<T> {
        &self.inner
    }

    /// Replace the contents with a sparse matrix of vector shape.
    pub fn set_from_matrix(&mut self, m: SparseMatrix<T>) -> Result<()> {
        let o = Orientation::of_shape(m.shape(), self.orientation)
            .filter(|&o| o == self.orientation)
            .ok_or(LinalgError::ShapeMismatch(self.shape(), m.shape()))?;
        let want = match o {
            Orientation::Column => Layout::ColMajor,
            Orientation::Row => Layout::RowMajor,
        };
        self.inner = if m.layout == want {
            m
        } else {
            let mut re = SparseMatrix::with_layout(m.rows, m.cols, want);
            for (i, j, v) in m.iter() {
                re.set(i, j, v)?;
            }
            re
        };
        Ok(())
    }

    pub fn view(&self) -> SparseRef<'_, T> {
        self.inner.view()
    }
}

// ============================================================================
// SparseRef
// ============================================================================

/// Read-only window over a [`SparseMatrix`] with lazy transpose and
/// conjugation.
///
/// The window `(row0, col0, rows, cols)` is kept in the coordinates of the
/// underlying matrix; `transposed` swaps the logical indices on top of it.
pub struct SparseRef<'a, T> {
    matrix: &'a SparseMatrix<T>,
    transposed: bool,
    op: ElementOp,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
}

impl<T> Clone for SparseRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SparseRef<'_, T> {}

impl<T> std::fmt::Debug for SparseRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseRef")
            .field("window", &(self.row0, self.col0, self.rows, self.cols))
            .field("transposed", &self.transposed)
            .field("op", &self.op)
            .finish()
    }
}

impl<'a, T: Scalar> SparseRef<'a, T> {
    pub fn rows(&self) -> usize {
        if self.transposed {
            self.cols
        } else {
            self.rows
        }
    }

    pub fn cols(&self) -> usize {
        if self.transposed {
            self.rows
        } else {
            self.cols
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn op(&self) -> ElementOp {
        self.op
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    pub fn matrix(&self) -> &'a SparseMatrix<T> {
        self.matrix
    }

    /// Whether the view covers the whole matrix untransposed and unconjugated.
    pub fn is_whole(&self) -> bool {
        !self.transposed
            && self.op.is_identity()
            && (self.row0, self.col0) == (0, 0)
            && (self.rows, self.cols) == self.matrix.shape()
    }

    /// Layout in which logical lines are stored contiguously.
    pub fn layout(&self) -> Layout {
        if self.transposed {
            self.matrix.layout.transposed()
        } else {
            self.matrix.layout
        }
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::sparse(self.layout())
    }

    pub fn span(&self) -> BufferSpan {
        self.matrix.span()
    }

    pub fn read_key(&self) -> ReadKey {
        ReadKey::Sparse {
            matrix: self.matrix as *const SparseMatrix<T> as usize,
            window: (self.row0, self.col0, self.rows, self.cols),
            transposed: self.transposed,
            op: self.op,
        }
    }

    #[inline]
    fn physical(&self, i: usize, j: usize) -> (usize, usize) {
        let (r, c) = if self.transposed { (j, i) } else { (i, j) };
        (r + self.row0, c + self.col0)
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.rows() && j < self.cols(),
            "index ({i}, {j}) out of bounds for {}x{} sparse view",
            self.rows(),
            self.cols()
        );
        let (r, c) = self.physical(i, j);
        self.op.apply(self.matrix.find(r, c).unwrap_or_else(T::zero))
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        check_index(i, j, self.shape())?;
        Ok(self.get(i, j))
    }

    pub fn transpose(&self) -> Self {
        Self {
            transposed: !self.transposed,
            ..*self
        }
    }

    pub fn conj(&self) -> Self {
        Self {
            op: self.op.compose(ElementOp::Conj),
            ..*self
        }
    }

    pub fn adjoint(&self) -> Self {
        self.transpose().conj()
    }

    pub fn submatrix(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
        let shape = self.shape();
        let fits = row.checked_add(rows).is_some_and(|e| e <= shape.0)
            && col.checked_add(cols).is_some_and(|e| e <= shape.1);
        if !fits {
            return Err(LinalgError::ShapeMismatch(
                shape,
                (row.saturating_add(rows), col.saturating_add(cols)),
            ));
        }
        let (r0, c0, pr, pc) = if self.transposed {
            (col, row, cols, rows)
        } else {
            (row, col, rows, cols)
        };
        Ok(Self {
            row0: self.row0 + r0,
            col0: self.col0 + c0,
            rows: pr,
            cols: pc,
            ..*self
        })
    }

    pub fn row(&self, i: usize) -> Result<Self> {
        self.submatrix(i, 0, 1, self.cols())
    }

    pub fn column(&self, j: usize) -> Result<Self> {
        self.submatrix(0, j, self.rows(), 1)
    }

    /// Visit stored entries inside the window as logical `(i, j, value)`.
    ///
    /// Entries come line by line in the storage order of the underlying
    /// matrix, ascending within each line.
    pub fn for_each(&self, mut f: impl FnMut(usize, usize, T)) {
        let m = self.matrix;
        let (lo, n, idx_lo, idx_n) = match m.layout {
            Layout::RowMajor => (self.row0, self.rows, self.col0, self.cols),
            Layout::ColMajor => (self.col0, self.cols, self.row0, self.rows),
        };
        for k in lo..lo + n {
            for (idx, v) in m.lines[k].range(idx_lo, idx_lo + idx_n) {
                let (r, c) = match m.layout {
                    Layout::RowMajor => (k - self.row0, idx - self.col0),
                    Layout::ColMajor => (idx - self.row0, k - self.col0),
                };
                let (i, j) = if self.transposed { (c, r) } else { (r, c) };
                f(i, j, self.op.apply(v));
            }
        }
    }

    /// Number of stored entries inside the window.
    pub fn nnz(&self) -> usize {
        let mut n = 0;
        self.for_each(|_, _, _| n += 1);
        n
    }
}
