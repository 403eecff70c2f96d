//! Resizable heap-backed dense matrix.

use lazymat_traits::{Access, Descriptor, Layout, Scalar, StructuralForm, Uplo};

use crate::span::BufferSpan;
use crate::view::{MatrixMut, MatrixRef};
use crate::{check_index, element_count, try_filled, LinalgError, Result};

/// Owned dense matrix with a fixed layout and structural form.
///
/// Structured matrices (anything but [`StructuralForm::General`]) are square
/// and keep a full `n x n` buffer, but only the positions the form stores are
/// meaningful; every read goes through [`MatrixRef`], which resolves mirrored
/// and implied positions. Writes are restricted to representable values:
///
/// - symmetric and Hermitian writes land on the stored triangle (the last
///   write to a pair `(i, j)` / `(j, i)` wins)
/// - Hermitian diagonal values given to [`DenseMatrix::set`] must be real;
///   a committed result keeps the real part of its diagonal
/// - implied-zero and implied-one positions accept only that value
#[derive(Clone)]
pub struct DenseMatrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    layout: Layout,
    form: StructuralForm,
    uplo: Uplo,
}

impl<T> std::fmt::Debug for DenseMatrix<T>
where
    T: Scalar,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseMatrix")
            .field("shape", &(self.rows, self.cols))
            .field("layout", &self.layout)
            .field("form", &self.form)
            .field("data", &self.view().to_row_major_vec())
            .finish()
    }
}

impl<T: Scalar> PartialEq for DenseMatrix<T> {
    /// Logical equality: shapes and every element as read through the form.
    fn eq(&self, other: &Self) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        let (a, b) = (self.view(), other.view());
        (0..self.rows).all(|i| (0..self.cols).all(|j| a.get(i, j) == b.get(i, j)))
    }
}

impl<T: Scalar> DenseMatrix<T> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Row-major `rows x cols` matrix of zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::zeros_with_layout(rows, cols, Layout::RowMajor)
    }

    pub fn zeros_with_layout(rows: usize, cols: usize, layout: Layout) -> Self {
        Self::filled_with_layout(rows, cols, layout, T::zero())
    }

    /// Fallible variant of [`Self::zeros_with_layout`].
    pub fn try_zeros(rows: usize, cols: usize, layout: Layout) -> Result<Self> {
        let data = try_filled(element_count(rows, cols)?, T::zero())?;
        Ok(Self::from_buffer(data, rows, cols, layout))
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::filled_with_layout(rows, cols, Layout::RowMajor, value)
    }

    pub fn filled_with_layout(rows: usize, cols: usize, layout: Layout, value: T) -> Self {
        Self::from_buffer(vec![value; rows * cols], rows, cols, layout)
    }

    /// Row-major matrix with `a[i][j] = f(i, j)`.
    pub fn from_fn(rows: usize, cols: usize, f: impl FnMut(usize, usize) -> T) -> Self {
        Self::from_fn_with_layout(rows, cols, Layout::RowMajor, f)
    }

    pub fn from_fn_with_layout(
        rows: usize,
        cols: usize,
        layout: Layout,
        mut f: impl FnMut(usize, usize) -> T,
    ) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        match layout {
            Layout::RowMajor => {
                for i in 0..rows {
                    for j in 0..cols {
                        data.push(f(i, j));
                    }
                }
            }
            Layout::ColMajor => {
                for j in 0..cols {
                    for i in 0..rows {
                        data.push(f(i, j));
                    }
                }
            }
        }
        Self::from_buffer(data, rows, cols, layout)
    }

    /// Matrix from row-major elements.
    pub fn from_row_slice(rows: usize, cols: usize, values: &[T]) -> Result<Self> {
        Self::from_vec(rows, cols, Layout::RowMajor, values.to_vec())
    }

    /// Take ownership of a buffer stored in `layout` order.
    pub fn from_vec(rows: usize, cols: usize, layout: Layout, data: Vec<T>) -> Result<Self> {
        let n = element_count(rows, cols)?;
        if data.len() != n {
            return Err(LinalgError::ShapeMismatch((rows, cols), (data.len(), 1)));
        }
        Ok(Self::from_buffer(data, rows, cols, layout))
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// `n x n` zero matrix of the given form, storing the lower triangle of
    /// symmetric and Hermitian forms.
    pub fn structured(n: usize, form: StructuralForm) -> Self {
        Self::structured_with(n, form, Uplo::Lower, Layout::RowMajor)
    }

    pub fn structured_with(n: usize, form: StructuralForm, uplo: Uplo, layout: Layout) -> Self {
        let mut m = Self::zeros_with_layout(n, n, layout);
        m.form = form;
        m.uplo = uplo;
        m
    }

    /// Copy the logical elements of `src` into a new general matrix.
    pub fn from_view(src: &MatrixRef<'_, T>, layout: Layout) -> Result<Self> {
        let mut out = Self::try_zeros(src.rows(), src.cols(), layout)?;
        for i in 0..src.rows() {
            for j in 0..src.cols() {
                let k = out.offset(i, j);
                out.data[k] = unsafe { src.get_unchecked(i, j) };
            }
        }
        Ok(out)
    }

    fn from_buffer(data: Vec<T>, rows: usize, cols: usize, layout: Layout) -> Self {
        Self {
            data,
            rows,
            cols,
            layout,
            form: StructuralForm::General,
            uplo: Uplo::Lower,
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

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
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn form(&self) -> StructuralForm {
        self.form
    }

    #[inline]
    pub fn uplo(&self) -> Uplo {
        self.uplo
    }

    pub fn descriptor(&self) -> Descriptor {
        Descriptor::dense(self.layout).with_form(self.form, self.uplo)
    }

    /// Allocated element capacity; always at least `rows * columns`.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    pub fn span(&self) -> BufferSpan {
        BufferSpan::of_elements(self.data.as_ptr(), self.data.len())
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        self.layout.offset(i, j, self.rows, self.cols)
    }

    // ------------------------------------------------------------------
    // Element access
    // ------------------------------------------------------------------

    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.view().get(i, j)
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        self.view().try_get(i, j)
    }

    /// # Safety
    /// Caller must ensure `i < rows` and `j < columns`.
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        self.view().get_unchecked(i, j)
    }

    /// Bounds- and structure-checked write.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        check_index(i, j, self.shape())?;
        let slot = self.write_slot(i, j, value)?;
        if let Some((k, v)) = slot {
            self.data[k] = v;
        }
        Ok(())
    }

    /// Write without bounds checking.
    ///
    /// Structural rules still apply: mirrored positions are redirected, and a
    /// value that the form cannot represent is dropped (a debug assertion
    /// fires in debug builds).
    ///
    /// # Safety
    /// Caller must ensure `i < rows` and `j < columns`.
    pub unsafe fn set_unchecked(&mut self, i: usize, j: usize, value: T) {
        match self.write_slot(i, j, value) {
            Ok(Some((k, v))) => *self.data.get_unchecked_mut(k) = v,
            Ok(None) => {}
            Err(e) => debug_assert!(false, "{e}"),
        }
    }

    /// Physical slot and value a logical write turns into, `None` for a
    /// no-op write of an implied value.
    fn write_slot(&self, i: usize, j: usize, value: T) -> Result<Option<(usize, T)>> {
        let invalid = LinalgError::InvalidStructuralWrite {
            row: i,
            col: j,
            form: self.form,
        };
        match self.form.access(i, j, self.uplo) {
            Access::Stored => {
                if self.form == StructuralForm::Hermitian && i == j && !value.is_real() {
                    return Err(invalid);
                }
                Ok(Some((self.offset(i, j), value)))
            }
            Access::Mirrored { conj } => {
                let v = if conj { value.conj() } else { value };
                Ok(Some((self.offset(j, i), v)))
            }
            Access::Zero if value.is_zero() => Ok(None),
            Access::One if value == T::one() => Ok(None),
            Access::Zero | Access::One => Err(invalid),
        }
    }

    // ------------------------------------------------------------------
    // Capacity
    // ------------------------------------------------------------------

    /// Change the shape, optionally keeping the overlapping elements.
    ///
    /// New elements are zero. Structured matrices stay square.
    pub fn resize(&mut self, rows: usize, cols: usize, preserve: bool) -> Result<()> {
        if self.form.requires_square() && rows != cols {
            return Err(LinalgError::NonSquare { rows, cols });
        }
        if (rows, cols) == self.shape() {
            if !preserve {
                self.data.iter_mut().for_each(|x| *x = T::zero());
            }
            return Ok(());
        }
        let mut data = try_filled(element_count(rows, cols)?, T::zero())?;
        if preserve {
            for i in 0..rows.min(self.rows) {
                for j in 0..cols.min(self.cols) {
                    data[self.layout.offset(i, j, rows, cols)] = self.data[self.offset(i, j)];
                }
            }
        }
        self.data = data;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Reserve room for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data
            .try_reserve(additional)
            .map_err(|_| LinalgError::AllocationFailure {
                elements: self.data.len().saturating_add(additional),
            })
    }

    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }

    // ------------------------------------------------------------------
    // Raw buffers and views
    // ------------------------------------------------------------------

    /// Physical buffer in [`Self::layout`] order.
    ///
    /// For structured matrices, positions outside the stored pattern are
    /// unspecified; read through [`Self::view`] instead.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable physical buffer, available for general storage only.
    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        self.form.is_general().then_some(self.data.as_mut_slice())
    }

    pub fn view(&self) -> MatrixRef<'_, T> {
        let v = MatrixRef::contiguous(&self.data, self.rows, self.cols, self.layout);
        // Shape and form were checked when the form was attached.
        v.with_structure(self.form, self.uplo).unwrap_or(v)
    }

    /// Mutable view; structured matrices refuse since raw writes could break
    /// the form.
    pub fn view_mut(&mut self) -> Result<MatrixMut<'_, T>> {
        if !self.form.is_general() {
            return Err(LinalgError::UnsupportedStructure(self.form));
        }
        Ok(MatrixMut::contiguous(
            &mut self.data,
            self.rows,
            self.cols,
            self.layout,
        ))
    }

    /// Apply `f` to every logical element, producing a general matrix.
    pub fn map<U: Scalar>(&self, mut f: impl FnMut(T) -> U) -> DenseMatrix<U> {
        let v = self.view();
        DenseMatrix::from_fn_with_layout(self.rows, self.cols, self.layout, |i, j| {
            f(unsafe { v.get_unchecked(i, j) })
        })
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Whether `src` can be stored under this matrix's form.
    ///
    /// Mirrored positions are not compared: a commit keeps the stored
    /// triangle, the same as a sequence of [`Self::set`] calls where the last
    /// write wins. For the same reason the imaginary part of a Hermitian
    /// diagonal is not compared either; [`Self::set_from`] stores the real
    /// part. Implied zero and one positions must match exactly.
    ///
    /// Returns the first position that violates the form.
    pub fn check_representable(&self, src: &MatrixRef<'_, T>) -> Result<()> {
        if self.form.is_general() {
            return Ok(());
        }
        let (rows, cols) = src.shape();
        if rows != cols {
            return Err(LinalgError::NonSquare { rows, cols });
        }
        for i in 0..rows {
            for j in 0..cols {
                let v = unsafe { src.get_unchecked(i, j) };
                let ok = match self.form.access(i, j, self.uplo) {
                    Access::Stored | Access::Mirrored { .. } => true,
                    Access::Zero => v.is_zero(),
                    Access::One => v == T::one(),
                };
                if !ok {
                    return Err(LinalgError::InvalidStructuralWrite {
                        row: i,
                        col: j,
                        form: self.form,
                    });
                }
            }
        }
        Ok(())
    }

    /// Replace the contents with the logical elements of `src`, resizing as
    /// needed.
    ///
    /// All checks and the allocation happen before the matrix is touched, so
    /// on error it is unchanged.
    pub fn set_from(&mut self, src: &MatrixRef<'_, T>) -> Result<()> {
        self.check_representable(src)?;
        let (rows, cols) = src.shape();
        let hermitian = self.form == StructuralForm::Hermitian;
        let mut data = try_filled(element_count(rows, cols)?, T::zero())?;
        for i in 0..rows {
            for j in 0..cols {
                if self.form.access(i, j, self.uplo) == Access::Stored {
                    let v = unsafe { src.get_unchecked(i, j) };
                    data[self.layout.offset(i, j, rows, cols)] =
                        if hermitian && i == j { v.real_part() } else { v };
                }
            }
        }
        self.data = data;
        self.rows = rows;
        self.cols = cols;
        Ok(())
    }

    /// Take over the buffer of a general matrix with the same layout, or copy
    /// through [`Self::set_from`] otherwise.
    pub fn replace(&mut self, src: DenseMatrix<T>) -> Result<()> {
        if self.form.is_general() && src.form.is_general() && src.layout == self.layout {
            self.data = src.data;
            self.rows = src.rows;
            self.cols = src.cols;
            Ok(())
        } else {
            self.set_from(&src.view())
        }
    }

    // ------------------------------------------------------------------
    // Numeric structural predicates
    // ------------------------------------------------------------------

    fn all_positions(&self, pred: impl Fn(usize, usize, &MatrixRef<'_, T>) -> bool) -> bool {
        let v = self.view();
        (0..self.rows).all(|i| (0..self.cols).all(|j| pred(i, j, &v)))
    }

    /// Square with `a[i][j] == a[j][i]` for every pair.
    pub fn is_symmetric(&self) -> bool {
        if self.form == StructuralForm::Symmetric || self.form == StructuralForm::Diagonal {
            return true;
        }
        self.is_square() && self.all_positions(|i, j, v| v.get(i, j) == v.get(j, i))
    }

    /// Square with `a[i][j] == conj(a[j][i])` for every pair.
    pub fn is_hermitian(&self) -> bool {
        if self.form == StructuralForm::Hermitian {
            return true;
        }
        self.is_square() && self.all_positions(|i, j, v| v.get(i, j) == v.get(j, i).conj())
    }

    /// Square with zeros above the diagonal.
    pub fn is_lower(&self) -> bool {
        self.is_square() && self.all_positions(|i, j, v| j <= i || v.get(i, j).is_zero())
    }

    /// Square with zeros below the diagonal.
    pub fn is_upper(&self) -> bool {
        self.is_square() && self.all_positions(|i, j, v| i <= j || v.get(i, j).is_zero())
    }

    pub fn is_diagonal(&self) -> bool {
        self.is_lower() && self.is_upper()
    }
}
