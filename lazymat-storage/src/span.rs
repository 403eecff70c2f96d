//! Buffer identity for alias analysis.

use std::mem::size_of;

use lazymat_traits::{ElementOp, StructuralForm, Uplo};

/// Half-open address range `[start, end)` an operand may touch.
///
/// Dense views report the range covered by their elements. Sparse views report
/// the address of the owning container, since their index storage is
/// reallocated on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSpan {
    start: usize,
    end: usize,
}

impl BufferSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Span of `count` elements starting at `ptr`.
    pub fn of_elements<T>(ptr: *const T, count: usize) -> Self {
        let start = ptr as usize;
        Self::new(start, start + count * size_of::<T>().max(1))
    }

    /// Span of the object itself.
    pub fn of_value<T>(value: &T) -> Self {
        let start = value as *const T as usize;
        Self::new(start, start + size_of::<T>().max(1))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Empty spans overlap nothing.
    #[inline]
    pub fn overlaps(&self, other: &BufferSpan) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

/// Exact element mapping of a dense 2-D window.
///
/// Two windows with equal mappings read and write the same address for every
/// `(i, j)`. Strides of extent-1 dimensions are normalized to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    pub origin: usize,
    pub rows: usize,
    pub cols: usize,
    pub row_stride: isize,
    pub col_stride: isize,
}

impl Mapping {
    pub fn new<T>(
        origin: *const T,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
    ) -> Self {
        Self {
            origin: origin as usize,
            rows,
            cols,
            row_stride: if rows <= 1 { 0 } else { row_stride },
            col_stride: if cols <= 1 { 0 } else { col_stride },
        }
    }
}

/// What a view reads at every logical `(i, j)`, including structure and lazy
/// element operations.
///
/// Views with equal keys read the same logical matrix, so a key identifies
/// reads of structured and sparse storage that have no [`Mapping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKey {
    Dense {
        origin: usize,
        rows: usize,
        cols: usize,
        row_stride: isize,
        col_stride: isize,
        form: StructuralForm,
        uplo: Uplo,
        op: ElementOp,
    },
    Sparse {
        matrix: usize,
        /// `(row0, col0, rows, cols)` in storage coordinates.
        window: (usize, usize, usize, usize),
        transposed: bool,
        op: ElementOp,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = BufferSpan::new(0, 16);
        let b = BufferSpan::new(8, 24);
        let c = BufferSpan::new(16, 32);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(!BufferSpan::new(4, 4).overlaps(&a));
        assert!(!a.overlaps(&BufferSpan::new(4, 4)));
        assert!(!BufferSpan::empty().overlaps(&BufferSpan::empty()));
    }

    #[test]
    fn test_slices_of_same_buffer() {
        let data = [0.0f64; 10];
        let whole = BufferSpan::of_elements(data.as_ptr(), 10);
        let tail = BufferSpan::of_elements(data[5..].as_ptr(), 5);
        assert!(whole.overlaps(&tail));
        let head = BufferSpan::of_elements(data.as_ptr(), 5);
        assert!(!head.overlaps(&tail));
    }

    #[test]
    fn test_mapping_normalizes_degenerate_strides() {
        let data = [0.0f32; 4];
        let a = Mapping::new(data.as_ptr(), 1, 4, 4, 1);
        let b = Mapping::new(data.as_ptr(), 1, 4, 1, 1);
        assert_eq!(a, b);
    }
}
