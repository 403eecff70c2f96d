//! Resizable dense vector.

use lazymat_traits::{Layout, Scalar};

use crate::span::BufferSpan;
use crate::view::{MatrixMut, MatrixRef};
use crate::{check_index, try_filled, LinalgError, Result};

/// Whether a vector behaves as an `n x 1` or a `1 x n` matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Column,
    Row,
}

impl Orientation {
    #[inline]
    pub fn shape(self, len: usize) -> (usize, usize) {
        match self {
            Orientation::Column => (len, 1),
            Orientation::Row => (1, len),
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Column => Orientation::Row,
            Orientation::Row => Orientation::Column,
        }
    }

    /// Orientation whose shape is `shape`, if `shape` is a vector shape.
    ///
    /// `1 x 1` is reported as `preferred`.
    pub fn of_shape(shape: (usize, usize), preferred: Orientation) -> Option<Self> {
        match shape {
            (1, 1) => Some(preferred),
            (_, 1) => Some(Orientation::Column),
            (1, _) => Some(Orientation::Row),
            _ => None,
        }
    }
}

/// Owned contiguous vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseVector<T> {
    data: Vec<T>,
    orientation: Orientation,
}

impl<T: Scalar> DenseVector<T> {
    /// Column vector of zeros.
    pub fn zeros(len: usize) -> Self {
        Self::filled(len, T::zero())
    }

    pub fn filled(len: usize, value: T) -> Self {
        Self {
            data: vec![value; len],
            orientation: Orientation::Column,
        }
    }

    pub fn try_zeros(len: usize, orientation: Orientation) -> Result<Self> {
        Ok(Self {
            data: try_filled(len, T::zero())?,
            orientation,
        })
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data,
            orientation: Orientation::Column,
        }
    }

    pub fn from_slice(values: &[T]) -> Self {
        Self::from_vec(values.to_vec())
    }

    pub fn from_fn(len: usize, f: impl FnMut(usize) -> T) -> Self {
        Self::from_vec((0..len).map(f).collect())
    }

    /// Same elements with the given orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Same elements, flipped orientation.
    pub fn transposed(self) -> Self {
        let o = self.orientation.flipped();
        self.with_orientation(o)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.orientation.shape(self.data.len())
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[i]
    }

    pub fn try_get(&self, i: usize) -> Result<T> {
        self.data
            .get(i)
            .copied()
            .ok_or(LinalgError::IndexOutOfRange {
                index: (i, 0),
                shape: (self.data.len(), 1),
            })
    }

    /// # Safety
    /// Caller must ensure `i < len`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> T {
        *self.data.get_unchecked(i)
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        check_index(i, 0, (self.data.len(), 1))?;
        self.data[i] = value;
        Ok(())
    }

    /// # Safety
    /// Caller must ensure `i < len`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, i: usize, value: T) {
        *self.data.get_unchecked_mut(i) = value;
    }

    /// Change the length; new elements are zero. Without `preserve` all
    /// elements are reset.
    pub fn resize(&mut self, len: usize, preserve: bool) -> Result<()> {
        if !preserve {
            self.data.iter_mut().for_each(|x| *x = T::zero());
        }
        if len > self.data.len() {
            self.reserve(len - self.data.len())?;
        }
        self.data.resize(len, T::zero());
        Ok(())
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data
            .try_reserve(additional)
            .map_err(|_| LinalgError::AllocationFailure {
                elements: self.data.len().saturating_add(additional),
            })
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn span(&self) -> BufferSpan {
        BufferSpan::of_elements(self.data.as_ptr(), self.data.len())
    }

    /// `n x 1` or `1 x n` view, per orientation.
    pub fn view(&self) -> MatrixRef<'_, T> {
        let (rows, cols) = self.shape();
        MatrixRef::contiguous(&self.data, rows, cols, Layout::RowMajor)
    }

    pub fn view_mut(&mut self) -> MatrixMut<'_, T> {
        let (rows, cols) = self.shape();
        MatrixMut::contiguous(&mut self.data, rows, cols, Layout::RowMajor)
    }

    /// Replace the contents with the elements of a vector-shaped view.
    ///
    /// The orientation must match unless the view is `1 x 1`.
    pub fn set_from(&mut self, src: &MatrixRef<'_, T>) -> Result<()> {
        let o = Orientation::of_shape(src.shape(), self.orientation)
            .filter(|&o| o == self.orientation)
            .ok_or(LinalgError::ShapeMismatch(self.shape(), src.shape()))?;
        let len = src.rows() * src.cols();
        let mut data = try_filled(len, T::zero())?;
        for (k, x) in data.iter_mut().enumerate() {
            *x = match o {
                Orientation::Column => src.get(k, 0),
                Orientation::Row => src.get(0, k),
            };
        }
        self.data = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_shapes() {
        let v = DenseVector::<f64>::zeros(4);
        assert_eq!(v.shape(), (4, 1));
        let r = v.transposed();
        assert_eq!(r.shape(), (1, 4));
        assert_eq!(r.view().shape(), (1, 4));
        assert_eq!(Orientation::of_shape((3, 4), Orientation::Row), None);
        assert_eq!(
            Orientation::of_shape((1, 1), Orientation::Row),
            Some(Orientation::Row)
        );
    }

    #[test]
    fn test_resize_preserve_and_reset() {
        let mut v = DenseVector::from_slice(&[1.0, 2.0, 3.0]);
        v.resize(5, true).unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0, 0.0, 0.0]);
        v.resize(2, false).unwrap();
        assert_eq!(v.as_slice(), &[0.0, 0.0]);
        assert!(v.capacity() >= 2);
    }

    #[test]
    fn test_checked_access() {
        let mut v = DenseVector::<i64>::zeros(2);
        v.set(1, 7).unwrap();
        assert_eq!(v.get(1), 7);
        assert!(v.set(2, 1).is_err());
        assert!(v.try_get(5).is_err());
    }

    #[test]
    fn test_set_from_checks_orientation() {
        let mut v = DenseVector::<f64>::zeros(2);
        let row = DenseVector::from_slice(&[1.0, 2.0, 3.0]).transposed();
        assert!(matches!(
            v.set_from(&row.view()),
            Err(LinalgError::ShapeMismatch(..))
        ));
        let col = DenseVector::from_slice(&[1.0, 2.0, 3.0]);
        v.set_from(&col.view()).unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
    }
}
