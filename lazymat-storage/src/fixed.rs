//! Fixed-size matrices and vectors with inline storage.

use lazymat_traits::{Layout, Scalar};

use crate::span::BufferSpan;
use crate::view::{MatrixMut, MatrixRef};
use crate::{check_index, Result};

/// `R x C` row-major matrix stored inline. Never resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticMatrix<T, const R: usize, const C: usize> {
    data: [[T; C]; R],
}

impl<T: Scalar, const R: usize, const C: usize> Default for StaticMatrix<T, R, C> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Scalar, const R: usize, const C: usize> StaticMatrix<T, R, C> {
    pub fn zeros() -> Self {
        Self::filled(T::zero())
    }

    pub fn filled(value: T) -> Self {
        Self {
            data: [[value; C]; R],
        }
    }

    pub fn from_rows(data: [[T; C]; R]) -> Self {
        Self { data }
    }

    pub fn from_fn(mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut m = Self::zeros();
        for (i, row) in m.data.iter_mut().enumerate() {
            for (j, x) in row.iter_mut().enumerate() {
                *x = f(i, j);
            }
        }
        m
    }

    #[inline]
    pub const fn rows(&self) -> usize {
        R
    }

    #[inline]
    pub const fn columns(&self) -> usize {
        C
    }

    #[inline]
    pub const fn shape(&self) -> (usize, usize) {
        (R, C)
    }

    #[inline]
    pub const fn is_square(&self) -> bool {
        R == C
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i][j]
    }

    pub fn try_get(&self, i: usize, j: usize) -> Result<T> {
        check_index(i, j, (R, C))?;
        Ok(self.data[i][j])
    }

    /// # Safety
    /// Caller must ensure `i < R` and `j < C`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize, j: usize) -> T {
        *self.data.get_unchecked(i).get_unchecked(j)
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<()> {
        check_index(i, j, (R, C))?;
        self.data[i][j] = value;
        Ok(())
    }

    /// # Safety
    /// Caller must ensure `i < R` and `j < C`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, i: usize, j: usize, value: T) {
        *self.data.get_unchecked_mut(i).get_unchecked_mut(j) = value;
    }

    pub fn as_slice(&self) -> &[T] {
        self.data.as_flattened()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_flattened_mut()
    }

    pub fn span(&self) -> BufferSpan {
        BufferSpan::of_elements(self.as_slice().as_ptr(), R * C)
    }

    pub fn view(&self) -> MatrixRef<'_, T> {
        MatrixRef::contiguous(self.as_slice(), R, C, Layout::RowMajor)
    }

    pub fn view_mut(&mut self) -> MatrixMut<'_, T> {
        MatrixMut::contiguous(self.as_mut_slice(), R, C, Layout::RowMajor)
    }

    pub fn into_rows(self) -> [[T; C]; R] {
        self.data
    }
}

/// Column vector of length `N` stored inline. Never resizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticVector<T, const N: usize> {
    data: [T; N],
}

impl<T: Scalar, const N: usize> Default for StaticVector<T, N> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<T: Scalar, const N: usize> StaticVector<T, N> {
    pub fn zeros() -> Self {
        Self {
            data: [T::zero(); N],
        }
    }

    pub fn from_array(data: [T; N]) -> Self {
        Self { data }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// # Panics
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        self.data[i]
    }

    pub fn try_get(&self, i: usize) -> Result<T> {
        check_index(i, 0, (N, 1))?;
        Ok(self.data[i])
    }

    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        check_index(i, 0, (N, 1))?;
        self.data[i] = value;
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn span(&self) -> BufferSpan {
        BufferSpan::of_elements(self.data.as_ptr(), N)
    }

    /// `N x 1` view.
    pub fn view(&self) -> MatrixRef<'_, T> {
        MatrixRef::contiguous(&self.data, N, 1, Layout::ColMajor)
    }

    pub fn view_mut(&mut self) -> MatrixMut<'_, T> {
        MatrixMut::contiguous(&mut self.data, N, 1, Layout::ColMajor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinalgError;

    #[test]
    fn test_static_matrix_access() {
        let mut m = StaticMatrix::<f64, 2, 3>::zeros();
        m.set(1, 2, 6.0).unwrap();
        assert_eq!(m.get(1, 2), 6.0);
        assert_eq!(m.as_slice()[5], 6.0);
        assert!(matches!(
            m.set(2, 0, 1.0),
            Err(LinalgError::IndexOutOfRange { .. })
        ));
        assert_eq!(m.view().get(1, 2), 6.0);
        assert_eq!(m.shape(), (2, 3));
        assert!(!m.is_square());
    }

    #[test]
    fn test_static_matrix_view_mut_writes_through() {
        let mut m = StaticMatrix::<i32, 2, 2>::from_rows([[1, 2], [3, 4]]);
        m.view_mut().set(0, 1, 9);
        assert_eq!(m.into_rows(), [[1, 9], [3, 4]]);
    }

    #[test]
    fn test_static_vector() {
        let mut v = StaticVector::<f32, 3>::from_array([1.0, 2.0, 3.0]);
        v.set(0, 5.0).unwrap();
        assert_eq!(v.view().shape(), (3, 1));
        assert_eq!(v.view().get(0, 0), 5.0);
        assert!(v.try_get(3).is_err());
        assert_eq!(v.len(), 3);
    }
}
