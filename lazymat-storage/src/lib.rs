//! Containers and views for lazymat.
//!
//! - [`DenseMatrix`] / [`DenseVector`]: resizable, heap-backed, row- or
//!   column-major, with optional structural form
//! - [`StaticMatrix`] / [`StaticVector`]: fixed-size, inline storage
//! - [`SparseMatrix`] / [`SparseVector`]: per-line sorted `(index, value)` storage
//! - [`MatrixRef`] / [`MatrixMut`] / [`SparseRef`]: non-owning views
//!
//! All dense containers expose their data through [`MatrixRef`], which
//! resolves structural forms on read. Layout only affects the
//! `(row_stride, col_stride)` pair of a view.

pub mod dense;
pub mod fixed;
pub mod sparse;
pub mod span;
pub mod vector;
pub mod view;

pub use dense::DenseMatrix;
pub use fixed::{StaticMatrix, StaticVector};
pub use lazymat_traits::{
    Access, Descriptor, ElementOp, ElementOpApply, Layout, Scalar, StorageKind, StructuralForm,
    Uplo,
};
pub use sparse::{SparseMatrix, SparseRef, SparseVector};
pub use span::{BufferSpan, Mapping, ReadKey};
pub use vector::{DenseVector, Orientation};
pub use view::{MatrixMut, MatrixRef};

// ============================================================================
// Error types
// ============================================================================

/// Errors raised by containers, expressions and assignments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinalgError {
    /// Operand or destination shapes are incompatible.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch((usize, usize), (usize, usize)),

    /// Checked element access outside the logical shape.
    #[error("index {index:?} out of range for shape {shape:?}")]
    IndexOutOfRange {
        index: (usize, usize),
        shape: (usize, usize),
    },

    /// A container or temporary could not be allocated.
    #[error("failed to allocate {elements} elements")]
    AllocationFailure { elements: usize },

    /// The value cannot be represented at this position of a structured matrix.
    #[error("cannot write ({row}, {col}) of {form:?} storage")]
    InvalidStructuralWrite {
        row: usize,
        col: usize,
        form: StructuralForm,
    },

    /// Matrix is not square when a square matrix was required.
    #[error("non-square matrix: rows={rows}, cols={cols}")]
    NonSquare { rows: usize, cols: usize },

    /// Sparse insert of a position that already holds a value.
    #[error("entry ({row}, {col}) already present")]
    DuplicateEntry { row: usize, col: usize },

    /// The operation needs general storage.
    #[error("operation not supported for {0:?} storage")]
    UnsupportedStructure(StructuralForm),

    /// Integer overflow while computing a view offset, or a view exceeding its buffer.
    #[error("offset overflow while computing pointer")]
    OffsetOverflow,

    /// An assignment target handle was used with a different destination.
    #[error("assignment target belongs to another destination")]
    ForeignTarget,
}

/// Result type for lazymat operations.
pub type Result<T> = std::result::Result<T, LinalgError>;

// ============================================================================
// Allocation helpers
// ============================================================================

/// Number of elements of a `rows x cols` buffer.
pub fn element_count(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or(LinalgError::AllocationFailure {
            elements: usize::MAX,
        })
}

/// Allocate `len` copies of `value`, reporting failure instead of aborting.
pub fn try_filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| LinalgError::AllocationFailure { elements: len })?;
    data.resize(len, value);
    Ok(data)
}

pub(crate) fn check_index(i: usize, j: usize, shape: (usize, usize)) -> Result<()> {
    if i < shape.0 && j < shape.1 {
        Ok(())
    } else {
        Err(LinalgError::IndexOutOfRange {
            index: (i, j),
            shape,
        })
    }
}
