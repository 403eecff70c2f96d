//! Storage descriptors: layout, structural form and storage kind.
//!
//! Descriptors are plain values. All structural knowledge lives in
//! [`StructuralForm::access`], which tells a reader whether a logical position
//! is physically stored, mirrored from its transpose, or implied to be zero or
//! one. Kernels that cannot exploit a form read through this function instead
//! of the raw buffer.

// ============================================================================
// Layout
// ============================================================================

/// Order of elements in a dense buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Last index varies fastest (C order).
    #[default]
    RowMajor,
    /// First index varies fastest (Fortran order).
    ColMajor,
}

impl Layout {
    /// `(row_stride, col_stride)` of a contiguous `rows x cols` buffer.
    #[inline]
    pub fn strides(self, rows: usize, cols: usize) -> (isize, isize) {
        match self {
            Layout::RowMajor => (cols as isize, 1),
            Layout::ColMajor => (1, rows as isize),
        }
    }

    /// Linear offset of `(i, j)` in a contiguous `rows x cols` buffer.
    #[inline]
    pub fn offset(self, i: usize, j: usize, rows: usize, cols: usize) -> usize {
        match self {
            Layout::RowMajor => i * cols + j,
            Layout::ColMajor => j * rows + i,
        }
    }

    #[inline]
    pub fn transposed(self) -> Self {
        match self {
            Layout::RowMajor => Layout::ColMajor,
            Layout::ColMajor => Layout::RowMajor,
        }
    }
}

// ============================================================================
// Uplo
// ============================================================================

/// Which triangle a symmetric or Hermitian container physically stores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Uplo {
    #[default]
    Lower,
    Upper,
}

impl Uplo {
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Uplo::Lower => Uplo::Upper,
            Uplo::Upper => Uplo::Lower,
        }
    }
}

// ============================================================================
// StorageKind
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Every logical element has a slot in a contiguous buffer.
    #[default]
    Dense,
    /// Only explicitly present `(index, value)` pairs are stored.
    Sparse,
}

// ============================================================================
// StructuralForm
// ============================================================================

/// Constraint on which positions of a matrix are independently storable.
///
/// Every form except [`StructuralForm::General`] requires a square matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StructuralForm {
    #[default]
    General,
    /// `a[i][j] == a[j][i]`; one triangle is stored.
    Symmetric,
    /// `a[i][j] == conj(a[j][i])`; one triangle is stored, the diagonal is real.
    Hermitian,
    /// Zero above the diagonal.
    Lower,
    /// Zero below the diagonal.
    Upper,
    /// Zero on and above the diagonal.
    StrictlyLower,
    /// Zero on and below the diagonal.
    StrictlyUpper,
    /// Zero above the diagonal, one on it.
    UnitLower,
    /// Zero below the diagonal, one on it.
    UnitUpper,
    /// Zero off the diagonal.
    Diagonal,
}

/// How a logical position of a structured matrix is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Physically stored at `(i, j)`.
    Stored,
    /// Equal to the stored element at `(j, i)`, conjugated when `conj` is set.
    /// Writes to this position land on `(j, i)`.
    Mirrored { conj: bool },
    /// Implied zero.
    Zero,
    /// Implied one.
    One,
}

impl Access {
    /// Whether a write to this position changes physical storage.
    #[inline]
    pub fn is_writable(self) -> bool {
        matches!(self, Access::Stored | Access::Mirrored { .. })
    }
}

impl StructuralForm {
    pub const ALL: [StructuralForm; 10] = [
        StructuralForm::General,
        StructuralForm::Symmetric,
        StructuralForm::Hermitian,
        StructuralForm::Lower,
        StructuralForm::Upper,
        StructuralForm::StrictlyLower,
        StructuralForm::StrictlyUpper,
        StructuralForm::UnitLower,
        StructuralForm::UnitUpper,
        StructuralForm::Diagonal,
    ];

    #[inline]
    pub fn is_general(self) -> bool {
        self == StructuralForm::General
    }

    #[inline]
    pub fn requires_square(self) -> bool {
        !self.is_general()
    }

    /// Symmetric or Hermitian.
    #[inline]
    pub fn is_self_adjoint(self) -> bool {
        matches!(self, StructuralForm::Symmetric | StructuralForm::Hermitian)
    }

    /// Resolve logical position `(i, j)`.
    ///
    /// `uplo` only matters for symmetric and Hermitian forms.
    #[inline]
    pub fn access(self, i: usize, j: usize, uplo: Uplo) -> Access {
        use StructuralForm::*;
        let stored_or_zero = |keep: bool| if keep { Access::Stored } else { Access::Zero };
        match self {
            General => Access::Stored,
            Symmetric | Hermitian => {
                let in_stored = match uplo {
                    Uplo::Lower => i >= j,
                    Uplo::Upper => i <= j,
                };
                if in_stored {
                    Access::Stored
                } else {
                    Access::Mirrored {
                        conj: self == Hermitian,
                    }
                }
            }
            Lower => stored_or_zero(i >= j),
            Upper => stored_or_zero(i <= j),
            StrictlyLower => stored_or_zero(i > j),
            StrictlyUpper => stored_or_zero(i < j),
            UnitLower if i == j => Access::One,
            UnitLower => stored_or_zero(i > j),
            UnitUpper if i == j => Access::One,
            UnitUpper => stored_or_zero(i < j),
            Diagonal => stored_or_zero(i == j),
        }
    }

    /// The form of the transposed matrix.
    ///
    /// Symmetric and Hermitian forms keep their form; the stored triangle
    /// flips, see [`Uplo::flipped`].
    #[inline]
    pub fn transposed(self) -> Self {
        use StructuralForm::*;
        match self {
            Lower => Upper,
            Upper => Lower,
            StrictlyLower => StrictlyUpper,
            StrictlyUpper => StrictlyLower,
            UnitLower => UnitUpper,
            UnitUpper => UnitLower,
            other => other,
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Complete storage description of a container or view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub layout: Layout,
    pub form: StructuralForm,
    pub uplo: Uplo,
    pub storage: StorageKind,
}

impl Descriptor {
    pub fn dense(layout: Layout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn sparse(layout: Layout) -> Self {
        Self {
            layout,
            storage: StorageKind::Sparse,
            ..Self::default()
        }
    }

    pub fn with_form(self, form: StructuralForm, uplo: Uplo) -> Self {
        Self { form, uplo, ..self }
    }

    /// Descriptor of the transposed operand.
    pub fn transposed(self) -> Self {
        Self {
            layout: self.layout.transposed(),
            form: self.form.transposed(),
            uplo: self.uplo.flipped(),
            storage: self.storage,
        }
    }

    #[inline]
    pub fn is_structured(&self) -> bool {
        !self.form.is_general()
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        self.storage == StorageKind::Sparse
    }

    #[inline]
    pub fn access(&self, i: usize, j: usize) -> Access {
        self.form.access(i, j, self.uplo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_offsets() {
        assert_eq!(Layout::RowMajor.strides(3, 4), (4, 1));
        assert_eq!(Layout::ColMajor.strides(3, 4), (1, 3));
        assert_eq!(Layout::RowMajor.offset(1, 2, 3, 4), 6);
        assert_eq!(Layout::ColMajor.offset(1, 2, 3, 4), 7);
        assert_eq!(Layout::RowMajor.transposed(), Layout::ColMajor);
    }

    #[test]
    fn test_symmetric_access() {
        let f = StructuralForm::Symmetric;
        assert_eq!(f.access(2, 1, Uplo::Lower), Access::Stored);
        assert_eq!(f.access(1, 1, Uplo::Lower), Access::Stored);
        assert_eq!(
            f.access(1, 2, Uplo::Lower),
            Access::Mirrored { conj: false }
        );
        assert_eq!(f.access(1, 2, Uplo::Upper), Access::Stored);
    }

    #[test]
    fn test_hermitian_mirror_conjugates() {
        let f = StructuralForm::Hermitian;
        assert_eq!(f.access(0, 3, Uplo::Lower), Access::Mirrored { conj: true });
        assert_eq!(f.access(3, 0, Uplo::Lower), Access::Stored);
    }

    #[test]
    fn test_triangular_access() {
        use StructuralForm::*;
        assert_eq!(Lower.access(0, 1, Uplo::Lower), Access::Zero);
        assert_eq!(Lower.access(1, 1, Uplo::Lower), Access::Stored);
        assert_eq!(StrictlyLower.access(1, 1, Uplo::Lower), Access::Zero);
        assert_eq!(StrictlyUpper.access(0, 1, Uplo::Lower), Access::Stored);
        assert_eq!(UnitLower.access(2, 2, Uplo::Lower), Access::One);
        assert_eq!(UnitLower.access(2, 1, Uplo::Lower), Access::Stored);
        assert_eq!(UnitUpper.access(2, 1, Uplo::Lower), Access::Zero);
        assert_eq!(Diagonal.access(2, 2, Uplo::Lower), Access::Stored);
        assert_eq!(Diagonal.access(2, 1, Uplo::Lower), Access::Zero);
    }

    #[test]
    fn test_writable() {
        assert!(Access::Stored.is_writable());
        assert!(Access::Mirrored { conj: true }.is_writable());
        assert!(!Access::Zero.is_writable());
        assert!(!Access::One.is_writable());
    }

    #[test]
    fn test_transpose_consistent_with_access() {
        for form in StructuralForm::ALL {
            for uplo in [Uplo::Lower, Uplo::Upper] {
                let t = Descriptor::dense(Layout::RowMajor).with_form(form, uplo);
                let tt = t.transposed();
                for i in 0..4 {
                    for j in 0..4 {
                        let a = t.access(j, i);
                        let b = tt.access(i, j);
                        let same_kind = match (a, b) {
                            (Access::Stored, Access::Stored) => true,
                            (Access::Mirrored { conj: x }, Access::Mirrored { conj: y }) => x == y,
                            (Access::Zero, Access::Zero) | (Access::One, Access::One) => true,
                            _ => false,
                        };
                        assert!(same_kind, "{form:?}/{uplo:?} at ({i}, {j}): {a:?} vs {b:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_double_transpose_is_identity() {
        for form in StructuralForm::ALL {
            let d = Descriptor::sparse(Layout::ColMajor).with_form(form, Uplo::Upper);
            assert_eq!(d.transposed().transposed(), d);
        }
    }
}
