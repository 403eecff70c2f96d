//! Non-owning 2-D views over dense buffers.
//!
//! - [`MatrixRef`]: immutable view carrying a structural form and a lazy
//!   element operation; transpose, conjugate, adjoint and sub-ranges are
//!   zero-copy
//! - [`MatrixMut`]: mutable view over general storage
//!
//! A view stores a raw base pointer plus the length of the buffer it was
//! created from, an origin offset and `(row_stride, col_stride)`. Structured
//! views also keep the window origin `(row0, col0)` in the coordinates of the
//! full structured matrix, so mirrored reads of a sub-range still find the
//! stored triangle.

use std::marker::PhantomData;

use lazymat_traits::{Access, Descriptor, ElementOp, Layout, Scalar, StructuralForm, Uplo};

use crate::span::{BufferSpan, Mapping, ReadKey};
use crate::{check_index, LinalgError, Result};

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate that every offset of a `rows x cols` window stays within `[0, len)`.
fn validate_bounds(
    len: usize,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    offset: isize,
) -> Result<()> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let mut min_offset = offset;
    let mut max_offset = offset;
    for (dim, stride) in [(rows, row_stride), (cols, col_stride)] {
        if dim > 1 {
            let end = stride
                .checked_mul(dim as isize - 1)
                .ok_or(LinalgError::OffsetOverflow)?;
            if end >= 0 {
                max_offset = max_offset
                    .checked_add(end)
                    .ok_or(LinalgError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(end)
                    .ok_or(LinalgError::OffsetOverflow)?;
            }
        }
    }
    if min_offset < 0 || max_offset as usize >= len {
        return Err(LinalgError::OffsetOverflow);
    }
    Ok(())
}

fn check_window(
    shape: (usize, usize),
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> Result<()> {
    let fits = row.checked_add(rows).is_some_and(|end| end <= shape.0)
        && col.checked_add(cols).is_some_and(|end| end <= shape.1);
    if fits {
        Ok(())
    } else {
        Err(LinalgError::ShapeMismatch(
            shape,
            (row.saturating_add(rows), col.saturating_add(cols)),
        ))
    }
}

/// Layout whose fast dimension has unit stride, if any.
///
/// This is the BLAS compatibility test: the other stride must be at least the
/// extent of the fast dimension.
pub(crate) fn unit_stride_layout(
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
) -> Option<Layout> {
    if col_stride == 1 && row_stride >= cols.max(1) as isize {
        Some(Layout::RowMajor)
    } else if row_stride == 1 && col_stride >= rows.max(1) as isize {
        Some(Layout::ColMajor)
    } else if rows <= 1 && col_stride == 1 {
        Some(Layout::RowMajor)
    } else if cols <= 1 && row_stride == 1 {
        Some(Layout::ColMajor)
    } else {
        None
    }
}

/// Layout under which the window is one gap-free run of memory.
pub(crate) fn contiguous_layout(
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
) -> Option<Layout> {
    if (col_stride == 1 || cols <= 1) && (row_stride == cols as isize || rows <= 1) {
        Some(Layout::RowMajor)
    } else if (row_stride == 1 || rows <= 1) && (col_stride == rows as isize || cols <= 1) {
        Some(Layout::ColMajor)
    } else {
        None
    }
}

fn span_of<T>(
    origin: *const T,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
) -> BufferSpan {
    if rows == 0 || cols == 0 {
        return BufferSpan::empty();
    }
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (dim, stride) in [(rows, row_stride), (cols, col_stride)] {
        let end = stride * (dim as isize - 1);
        if end >= 0 {
            hi += end;
        } else {
            lo += end;
        }
    }
    let first = origin.wrapping_offset(lo);
    BufferSpan::of_elements(first, (hi - lo) as usize + 1)
}

// ============================================================================
// MatrixRef
// ============================================================================

/// Immutable 2-D view with structural form and lazy element operation.
///
/// Reads resolve the structural form through [`StructuralForm::access`] and
/// then apply the element operation, so a transposed Hermitian view or a
/// conjugated lower-triangular view return the mathematically correct value
/// for every position.
pub struct MatrixRef<'a, T> {
    base: *const T,
    len: usize,
    origin: isize,
    row0: usize,
    col0: usize,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    form: StructuralForm,
    uplo: Uplo,
    op: ElementOp,
    _marker: PhantomData<&'a [T]>,
}

unsafe impl<T: Sync> Send for MatrixRef<'_, T> {}
unsafe impl<T: Sync> Sync for MatrixRef<'_, T> {}

impl<T> Clone for MatrixRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatrixRef<'_, T> {}

impl<T> std::fmt::Debug for MatrixRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixRef")
            .field("shape", &(self.rows, self.cols))
            .field("strides", &(self.row_stride, self.col_stride))
            .field("origin", &self.origin)
            .field("form", &self.form)
            .field("op", &self.op)
            .finish()
    }
}

impl<'a, T> MatrixRef<'a, T> {
    /// View a contiguous buffer as a `rows x cols` matrix.
    pub fn new(data: &'a [T], rows: usize, cols: usize, layout: Layout) -> Result<Self> {
        let (rs, cs) = layout.strides(rows, cols);
        Self::from_parts(data, rows, cols, rs, cs, 0)
    }

    /// View an arbitrary strided window of `data`.
    pub fn from_parts(
        data: &'a [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), rows, cols, row_stride, col_stride, offset)?;
        Ok(unsafe {
            Self::from_raw_parts(
                data.as_ptr(),
                data.len(),
                rows,
                cols,
                row_stride,
                col_stride,
                offset,
            )
        })
    }

    /// Infallible constructor for containers that own exactly `rows * cols` elements.
    pub(crate) fn contiguous(data: &'a [T], rows: usize, cols: usize, layout: Layout) -> Self {
        debug_assert!(data.len() >= rows * cols);
        let (rs, cs) = layout.strides(rows, cols);
        unsafe { Self::from_raw_parts(data.as_ptr(), data.len(), rows, cols, rs, cs, 0) }
    }

    /// Create a view from raw parts.
    ///
    /// # Safety
    /// `base` must point to `len` initialized elements that stay valid and are
    /// not written through other pointers for `'a`, except by a [`MatrixMut`]
    /// built from the same pointer whose writes never race with reads of this
    /// view. Every offset of the window must lie in `[0, len)`.
    pub unsafe fn from_raw_parts(
        base: *const T,
        len: usize,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Self {
        Self {
            base,
            len,
            origin: offset,
            row0: 0,
            col0: 0,
            rows,
            cols,
            row_stride,
            col_stride,
            form: StructuralForm::General,
            uplo: Uplo::Lower,
            op: ElementOp::Identity,
            _marker: PhantomData,
        }
    }

    /// Attach a structural form to a full (non-windowed) view.
    pub fn with_structure(mut self, form: StructuralForm, uplo: Uplo) -> Result<Self> {
        if form.requires_square() && self.rows != self.cols {
            return Err(LinalgError::NonSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !self.form.is_general() {
            return Err(LinalgError::UnsupportedStructure(self.form));
        }
        self.form = form;
        self.uplo = uplo;
        Ok(self)
    }

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

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    #[inline]
    pub fn form(&self) -> StructuralForm {
        self.form
    }

    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    #[inline]
    pub fn op(&self) -> ElementOp {
        self.op
    }

    /// General storage with no pending element operation: raw reads are exact.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.form.is_general() && self.op.is_identity()
    }

    /// Layout with a unit-stride fast dimension (BLAS compatible), if any.
    pub fn unit_stride_layout(&self) -> Option<Layout> {
        unit_stride_layout(self.rows, self.cols, self.row_stride, self.col_stride)
    }

    /// Layout under which the window is a single gap-free run, if any.
    pub fn contiguous_layout(&self) -> Option<Layout> {
        contiguous_layout(self.rows, self.cols, self.row_stride, self.col_stride)
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::dense(self.unit_stride_layout().unwrap_or_default())
            .with_form(self.form, self.uplo)
    }

    #[inline]
    fn physical(&self, si: usize, sj: usize) -> isize {
        self.origin + si as isize * self.row_stride + sj as isize * self.col_stride
    }

    /// Pointer to logical element `(0, 0)`; only meaningful for general views.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.base.wrapping_offset(self.physical(self.row0, self.col0))
    }

    /// Memory this view may read.
    ///
    /// Structured views may read mirrored positions outside their window, so
    /// they report the whole backing buffer.
    pub fn span(&self) -> BufferSpan {
        if self.form.is_general() {
            span_of(
                self.as_ptr(),
                self.rows,
                self.cols,
                self.row_stride,
                self.col_stride,
            )
        } else if self.len == 0 {
            BufferSpan::empty()
        } else {
            BufferSpan::of_elements(self.base, self.len)
        }
    }

    pub fn read_key(&self) -> ReadKey {
        ReadKey::Dense {
            origin: self.as_ptr() as usize,
            rows: self.rows,
            cols: self.cols,
            row_stride: if self.rows <= 1 { 0 } else { self.row_stride },
            col_stride: if self.cols <= 1 { 0 } else { self.col_stride },
            form: self.form,
            uplo: self.uplo,
            op: self.op,
        }
    }

    /// Exact element mapping, for plain views only.
    pub fn mapping(&self) -> Option<Mapping> {
        self.is_plain().then(|| {
            Mapping::new(
                self.as_ptr(),
                self.rows,
                self.cols,
                self.row_stride,
                self.col_stride,
            )
        })
    }

    /// Zero-copy transpose.
    pub fn transpose(&self) -> Self {
        Self {
            row0: self.col0,
            col0: self.row0,
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            form: self.form.transposed(),
            uplo: self.uplo.flipped(),
            ..*self
        }
    }

    /// Zero-copy element-wise conjugate.
    pub fn conj(&self) -> Self {
        Self {
            op: self.op.compose(ElementOp::Conj),
            ..*self
        }
    }

    /// Zero-copy conjugate transpose.
    pub fn adjoint(&self) -> Self {
        self.transpose().conj()
    }

    /// `rows x cols` window starting at `(row, col)`.
    pub fn submatrix(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
        check_window(self.shape(), row, col, rows, cols)?;
        if self.form.is_general() {
            Ok(Self {
                origin: self.physical(row, col),
                rows,
                cols,
                ..*self
            })
        } else {
            Ok(Self {
                row0: self.row0 + row,
                col0: self.col0 + col,
                rows,
                cols,
                ..*self
            })
        }
    }

    /// Row `i` as a `1 x cols` view.
    pub fn row(&self, i: usize) -> Result<Self> {
        self.submatrix(i, 0, 1, self.cols)
    }

    /// Column `j` as a `rows x 1` view.
    pub fn column(&self, j: usize) -> Result<Self> {
        self.submatrix(0, j, self.rows, 1)
    }

    /// Contiguous elements of a plain view in `layout` order.
    ///
    /// Returns `None` unless [`Self::contiguous_layout`] matches `layout` (or
    /// the view is a vector) and the view is plain.
    pub fn as_slice(&self, layout: Layout) -> Option<&'a [T]> {
        if !self.is_plain() {
            return None;
        }
        let n = self.rows * self.cols;
        if n == 0 {
            return Some(&[]);
        }
        let matches = self.rows <= 1
            || self.cols <= 1
            || self.contiguous_layout() == Some(layout);
        if !matches || self.contiguous_layout().is_none() {
            return None;
        }
        Some(unsafe { std::slice::from_raw_parts(self.as_ptr(), n) })
    }
}

impl<'a, T: Scalar> MatrixRef<'a, T> {
    /// Element `(i, j)` with structure and element operation applied.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} view",
            self.rows,
            self.cols
        );
        unsafe { self.get_unchecked(i, j) }
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        check_index(i, j, self.shape())?;
        Ok(unsafe { self.get_unchecked(i, j) })
    }

    /// Element `(i, j)` without bounds checking.
    ///
    /// # Safety
    /// Caller must ensure `i < rows` and `j < cols`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        let (si, sj) = (i + self.row0, j + self.col0);
        let value = match self.form.access(si, sj, self.uplo) {
            Access::Stored => *self.base.offset(self.physical(si, sj)),
            Access::Mirrored { conj } => {
                let v = *self.base.offset(self.physical(sj, si));
                if conj {
                    v.conj()
                } else {
                    v
                }
            }
            Access::Zero => T::zero(),
            Access::One => T::one(),
        };
        self.op.apply(value)
    }

    /// Copy the logical elements into a row-major `Vec`.
    pub fn to_row_major_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.push(unsafe { self.get_unchecked(i, j) });
            }
        }
        out
    }
}

// ============================================================================
// MatrixMut
// ============================================================================

/// Mutable 2-D view over general storage.
///
/// Always plain: structured containers do not hand out mutable views, so
/// every write here is representable.
pub struct MatrixMut<'a, T> {
    base: *mut T,
    len: usize,
    origin: isize,
    rows: usize,
    cols: usize,
    row_stride: isize,
    col_stride: isize,
    _marker: PhantomData<&'a mut [T]>,
}

unsafe impl<T: Send> Send for MatrixMut<'_, T> {}

impl<T> std::fmt::Debug for MatrixMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatrixMut")
            .field("shape", &(self.rows, self.cols))
            .field("strides", &(self.row_stride, self.col_stride))
            .field("origin", &self.origin)
            .finish()
    }
}

impl<'a, T> MatrixMut<'a, T> {
    pub fn new(data: &'a mut [T], rows: usize, cols: usize, layout: Layout) -> Result<Self> {
        let (rs, cs) = layout.strides(rows, cols);
        Self::from_parts(data, rows, cols, rs, cs, 0)
    }

    pub fn from_parts(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Result<Self> {
        validate_bounds(data.len(), rows, cols, row_stride, col_stride, offset)?;
        Ok(unsafe {
            Self::from_raw_parts(
                data.as_mut_ptr(),
                data.len(),
                rows,
                cols,
                row_stride,
                col_stride,
                offset,
            )
        })
    }

    pub(crate) fn contiguous(data: &'a mut [T], rows: usize, cols: usize, layout: Layout) -> Self {
        debug_assert!(data.len() >= rows * cols);
        let (rs, cs) = layout.strides(rows, cols);
        let len = data.len();
        unsafe { Self::from_raw_parts(data.as_mut_ptr(), len, rows, cols, rs, cs, 0) }
    }

    /// Create a mutable view from raw parts.
    ///
    /// # Safety
    /// `base` must point to `len` initialized elements valid for `'a` with no
    /// other writer. Readers built from the same pointer must not observe a
    /// write to an element before they are done reading it. Every offset of
    /// the window must lie in `[0, len)`.
    pub unsafe fn from_raw_parts(
        base: *mut T,
        len: usize,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        offset: isize,
    ) -> Self {
        Self {
            base,
            len,
            origin: offset,
            rows,
            cols,
            row_stride,
            col_stride,
            _marker: PhantomData,
        }
    }

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

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    #[inline]
    pub fn row_stride(&self) -> isize {
        self.row_stride
    }

    #[inline]
    pub fn col_stride(&self) -> isize {
        self.col_stride
    }

    /// Pointer to element `(0, 0)`.
    #[inline]
    pub fn as_mut_ptr(&self) -> *mut T {
        self.base.wrapping_offset(self.origin)
    }

    pub fn unit_stride_layout(&self) -> Option<Layout> {
        unit_stride_layout(self.rows, self.cols, self.row_stride, self.col_stride)
    }

    pub fn contiguous_layout(&self) -> Option<Layout> {
        contiguous_layout(self.rows, self.cols, self.row_stride, self.col_stride)
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::dense(self.unit_stride_layout().unwrap_or_default())
    }

    pub fn span(&self) -> BufferSpan {
        span_of(
            self.as_mut_ptr() as *const T,
            self.rows,
            self.cols,
            self.row_stride,
            self.col_stride,
        )
    }

    pub fn mapping(&self) -> Mapping {
        Mapping::new(
            self.as_mut_ptr() as *const T,
            self.rows,
            self.cols,
            self.row_stride,
            self.col_stride,
        )
    }

    /// Reborrow as an immutable view.
    pub fn rb(&self) -> MatrixRef<'_, T> {
        unsafe {
            MatrixRef::from_raw_parts(
                self.base,
                self.len,
                self.rows,
                self.cols,
                self.row_stride,
                self.col_stride,
                self.origin,
            )
        }
    }

    /// Immutable view of the same window that is not tied to this borrow.
    ///
    /// Used to read the destination of an in-place evaluation.
    ///
    /// # Safety
    /// The returned view must not outlive `'a`, and no read through it may
    /// observe a write through `self` to the same element before that read
    /// is finished.
    pub unsafe fn alias(&self) -> MatrixRef<'a, T> {
        MatrixRef::from_raw_parts(
            self.base,
            self.len,
            self.rows,
            self.cols,
            self.row_stride,
            self.col_stride,
            self.origin,
        )
    }

    /// Reborrow mutably for a shorter lifetime.
    pub fn rb_mut(&mut self) -> MatrixMut<'_, T> {
        MatrixMut {
            base: self.base,
            len: self.len,
            origin: self.origin,
            rows: self.rows,
            cols: self.cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            _marker: PhantomData,
        }
    }

    /// Zero-copy transpose (consumes self to preserve exclusivity).
    pub fn transpose(self) -> Self {
        Self {
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            ..self
        }
    }

    pub fn submatrix(self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
        check_window(self.shape(), row, col, rows, cols)?;
        Ok(Self {
            origin: self.origin + row as isize * self.row_stride + col as isize * self.col_stride,
            rows,
            cols,
            ..self
        })
    }

    #[inline]
    fn offset_of(&self, i: usize, j: usize) -> isize {
        self.origin + i as isize * self.row_stride + j as isize * self.col_stride
    }

    /// Contiguous elements, when the window is one gap-free run.
    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        let n = self.rows * self.cols;
        if n == 0 {
            return Some(&mut []);
        }
        self.contiguous_layout()?;
        Some(unsafe { std::slice::from_raw_parts_mut(self.as_mut_ptr(), n) })
    }
}

impl<'a, T: Copy> MatrixMut<'a, T> {
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} view",
            self.rows,
            self.cols
        );
        unsafe { self.get_unchecked(i, j) }
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        check_index(i, j, self.shape())?;
        Ok(unsafe { self.get_unchecked(i, j) })
    }

    /// # Safety
    /// Caller must ensure `i < rows` and `j < cols`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        *self.base.offset(self.offset_of(i, j))
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} view",
            self.rows,
            self.cols
        );
        unsafe { self.set_unchecked(i, j, value) }
    }

    pub fn try_set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        check_index(i, j, self.shape())?;
        unsafe { self.set_unchecked(i, j, value) };
        Ok(())
    }

    /// # Safety
    /// Caller must ensure `i < rows` and `j < cols`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, i: usize, j: usize, value: T) {
        *self.base.offset(self.offset_of(i, j)) = value;
    }

    pub fn fill(&mut self, value: T) {
        for i in 0..self.rows {
            for j in 0..self.cols {
                unsafe { self.set_unchecked(i, j, value) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn iota(n: usize) -> Vec<f64> {
        (0..n).map(|x| x as f64).collect()
    }

    #[test]
    fn test_row_and_col_major_agree() {
        let data = iota(6);
        let r = MatrixRef::new(&data, 2, 3, Layout::RowMajor).unwrap();
        let c = MatrixRef::new(&data, 3, 2, Layout::ColMajor).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(r.get(i, j), c.get(j, i));
            }
        }
        assert_eq!(r.get(1, 2), 5.0);
    }

    #[test]
    fn test_from_parts_rejects_overrun() {
        let data = iota(5);
        let err = MatrixRef::new(&data, 2, 3, Layout::RowMajor).unwrap_err();
        assert_eq!(err, LinalgError::OffsetOverflow);
        assert!(MatrixRef::from_parts(&data, 2, 2, 3, 1, 0).is_ok());
        assert!(MatrixRef::from_parts(&data, 2, 2, 3, 1, 1).is_err());
        assert!(MatrixRef::from_parts(&data, 2, 2, -3, 1, 3).is_ok());
        assert!(MatrixRef::from_parts(&data, 2, 2, -3, 1, 2).is_err());
    }

    #[test]
    fn test_transpose_is_involutive() {
        let data = iota(12);
        let a = MatrixRef::new(&data, 3, 4, Layout::RowMajor).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), (4, 3));
        assert_eq!(t.get(2, 1), a.get(1, 2));
        let tt = t.transpose();
        assert_eq!(tt.to_row_major_vec(), a.to_row_major_vec());
        assert_eq!(tt.mapping(), a.mapping());
    }

    #[test]
    fn test_submatrix_and_span() {
        let data = iota(16);
        let a = MatrixRef::new(&data, 4, 4, Layout::RowMajor).unwrap();
        let s = a.submatrix(1, 1, 2, 2).unwrap();
        assert_eq!(s.to_row_major_vec(), vec![5.0, 6.0, 9.0, 10.0]);
        assert!(s.span().overlaps(&a.span()));
        let top = a.submatrix(0, 0, 1, 4).unwrap();
        assert!(!top.span().overlaps(&s.span()));
        assert!(a.submatrix(3, 3, 2, 1).is_err());
    }

    #[test]
    fn test_symmetric_view_reads_mirror() {
        // lower triangle stored, upper left as garbage
        let data = vec![1.0, 99.0, 99.0, 2.0, 3.0, 99.0, 4.0, 5.0, 6.0];
        let a = MatrixRef::new(&data, 3, 3, Layout::RowMajor)
            .unwrap()
            .with_structure(StructuralForm::Symmetric, Uplo::Lower)
            .unwrap();
        assert_eq!(a.get(0, 2), 4.0);
        assert_eq!(a.get(2, 0), 4.0);
        let t = a.transpose();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(t.get(i, j), a.get(j, i));
            }
        }
        let s = a.submatrix(0, 1, 2, 2).unwrap();
        assert_eq!(s.get(0, 0), 2.0);
        assert_eq!(s.get(0, 1), 4.0);
        assert_eq!(s.get(1, 1), 5.0);
    }

    #[test]
    fn test_hermitian_adjoint_is_self() {
        let z = Complex64::new;
        let data = vec![z(1.0, 0.0), z(0.0, 0.0), z(2.0, 3.0), z(4.0, 0.0)];
        let h = MatrixRef::new(&data, 2, 2, Layout::RowMajor)
            .unwrap()
            .with_structure(StructuralForm::Hermitian, Uplo::Lower)
            .unwrap();
        assert_eq!(h.get(0, 1), z(2.0, -3.0));
        let adj = h.adjoint();
        for i in 0..2 {
            for j in 0..2 {
                assert_eq!(adj.get(i, j), h.get(i, j));
            }
        }
    }

    #[test]
    fn test_unit_lower_view() {
        let data = vec![7.0, 7.0, 2.0, 7.0];
        let a = MatrixRef::new(&data, 2, 2, Layout::RowMajor)
            .unwrap()
            .with_structure(StructuralForm::UnitLower, Uplo::Lower)
            .unwrap();
        assert_eq!(a.to_row_major_vec(), vec![1.0, 0.0, 2.0, 1.0]);
        assert!(a.mapping().is_none());
    }

    #[test]
    fn test_with_structure_requires_square() {
        let data = iota(6);
        let a = MatrixRef::new(&data, 2, 3, Layout::RowMajor).unwrap();
        assert_eq!(
            a.with_structure(StructuralForm::Lower, Uplo::Lower)
                .unwrap_err(),
            LinalgError::NonSquare { rows: 2, cols: 3 }
        );
    }

    #[test]
    fn test_layout_queries() {
        let data = iota(12);
        let r = MatrixRef::new(&data, 3, 4, Layout::RowMajor).unwrap();
        assert_eq!(r.unit_stride_layout(), Some(Layout::RowMajor));
        assert_eq!(r.contiguous_layout(), Some(Layout::RowMajor));
        assert_eq!(r.transpose().contiguous_layout(), Some(Layout::ColMajor));
        let s = r.submatrix(0, 0, 2, 2).unwrap();
        assert_eq!(s.unit_stride_layout(), Some(Layout::RowMajor));
        assert_eq!(s.contiguous_layout(), None);
        assert!(s.as_slice(Layout::RowMajor).is_none());
        assert_eq!(r.as_slice(Layout::RowMajor).unwrap().len(), 12);
    }

    #[test]
    fn test_matrix_mut_roundtrip() {
        let mut data = vec![0.0; 6];
        {
            let mut m = MatrixMut::new(&mut data, 2, 3, Layout::ColMajor).unwrap();
            m.set(1, 2, 4.5);
            assert_eq!(m.try_set(2, 0, 1.0).unwrap_err(), LinalgError::IndexOutOfRange {
                index: (2, 0),
                shape: (2, 3)
            });
            assert_eq!(m.rb().get(1, 2), 4.5);
            let mut t = m.transpose();
            t.set(0, 1, 2.0);
        }
        assert_eq!(data[5], 4.5);
        assert_eq!(data[1], 2.0);
    }

    #[test]
    fn test_matrix_mut_fill_submatrix() {
        let mut data = vec![0.0; 9];
        {
            let m = MatrixMut::new(&mut data, 3, 3, Layout::RowMajor).unwrap();
            let mut s = m.submatrix(1, 1, 2, 2).unwrap();
            s.fill(1.0);
            assert!(s.as_mut_slice().is_none());
        }
        assert_eq!(data, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
    }
}
