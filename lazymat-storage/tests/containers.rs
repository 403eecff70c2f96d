use lazymat_storage::{
    DenseMatrix, Layout, LinalgError, SparseMatrix, SparseVector, StaticMatrix, StructuralForm,
};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[test]
fn sparse_random_insertion_iterates_sorted_and_exact() {
    let mut rng = StdRng::seed_from_u64(42);
    let (rows, cols) = (37, 53);
    let mut positions: Vec<(usize, usize)> = (0..rows)
        .flat_map(|i| (0..cols).map(move |j| (i, j)))
        .filter(|_| rng.gen_bool(0.15))
        .collect();
    positions.shuffle(&mut rng);

    for layout in [Layout::RowMajor, Layout::ColMajor] {
        let mut m = SparseMatrix::<f64>::with_layout(rows, cols, layout);
        for &(i, j) in &positions {
            m.insert(i, j, (i * 1000 + j) as f64).unwrap();
        }
        assert_eq!(m.nnz(), positions.len());
        for k in 0..m.line_count() {
            let idx: Vec<usize> = m.line(k).map(|(idx, _)| idx).collect();
            assert!(idx.windows(2).all(|w| w[0] < w[1]));
            // restartable
            assert_eq!(idx, m.line(k).map(|(idx, _)| idx).collect::<Vec<_>>());
        }
        for (i, j, v) in m.iter() {
            assert_eq!(v, (i * 1000 + j) as f64);
        }
        let &(i, j) = positions.first().unwrap();
        assert_eq!(
            m.insert(i, j, 0.0),
            Err(LinalgError::DuplicateEntry { row: i, col: j })
        );
    }
}

#[test]
fn symmetric_write_mirrors_last_write_wins() {
    let mut s = DenseMatrix::<f64>::structured(4, StructuralForm::Symmetric);
    s.set(0, 3, 1.0).unwrap();
    s.set(3, 0, 2.0).unwrap();
    assert_eq!(s.get(0, 3), 2.0);
    assert_eq!(s.get(3, 0), 2.0);
    assert!(s.is_symmetric());
}

#[test]
fn hermitian_rejects_complex_diagonal() {
    let mut h = DenseMatrix::<Complex64>::structured(3, StructuralForm::Hermitian);
    h.set(2, 0, Complex64::new(1.0, 2.0)).unwrap();
    assert_eq!(h.get(0, 2), Complex64::new(1.0, -2.0));
    let err = h.set(1, 1, Complex64::new(0.0, 1.0)).unwrap_err();
    assert!(matches!(err, LinalgError::InvalidStructuralWrite { .. }));
    assert!(h.is_hermitian());
}

#[test]
fn triangular_rejects_implied_positions() {
    let mut l = DenseMatrix::<f64>::structured(3, StructuralForm::UnitLower);
    assert_eq!(l.get(1, 1), 1.0);
    l.set(2, 0, 5.0).unwrap();
    assert!(l.set(0, 2, 1.0).is_err());
    // Writing the implied value is a no-op.
    l.set(0, 2, 0.0).unwrap();
    l.set(1, 1, 1.0).unwrap();
    assert!(l.is_lower());
    assert!(!l.is_upper());
}

#[test]
fn dense_resize_preserves_overlap_and_zero_fills() {
    let mut m = DenseMatrix::from_fn_with_layout(2, 3, Layout::ColMajor, |i, j| (i * 3 + j) as i32 + 1);
    m.resize(3, 2, true).unwrap();
    assert_eq!(m.shape(), (3, 2));
    assert_eq!(m.get(1, 1), 5);
    assert_eq!(m.get(2, 0), 0);
    m.resize(1, 1, false).unwrap();
    assert_eq!(m.get(0, 0), 0);
}

#[test]
fn transpose_view_is_involution() {
    let m = DenseMatrix::from_fn(4, 6, |i, j| (i * 6 + j) as f64);
    let t = m.view().transpose();
    assert_eq!(t.shape(), (6, 4));
    assert_eq!(t.get(5, 3), m.get(3, 5));
    let tt = t.transpose();
    for i in 0..4 {
        for j in 0..6 {
            assert_eq!(tt.get(i, j), m.get(i, j));
        }
    }
}

#[test]
fn static_and_sparse_vector_basics() {
    let mut s = StaticMatrix::<f64, 2, 2>::zeros();
    s.set(1, 0, 3.0).unwrap();
    assert_eq!(s.get(1, 0), 3.0);
    assert!(s.try_get(2, 0).is_err());

    let mut v = SparseVector::<f64>::new(10);
    v.insert(7, 1.0).unwrap();
    v.insert(2, 2.0).unwrap();
    v.set(7, 4.0).unwrap();
    assert_eq!(v.iter().collect::<Vec<_>>(), vec![(2, 2.0), (7, 4.0)]);
    v.resize(5);
    assert_eq!(v.nnz(), 1);
}

#[test]
fn allocation_failure_is_reported_and_leaves_matrix_unchanged() {
    assert!(matches!(
        DenseMatrix::<f64>::try_zeros(usize::MAX, 2, Layout::RowMajor),
        Err(LinalgError::AllocationFailure { .. })
    ));
    // fits in usize, but not in any address space
    assert!(matches!(
        DenseMatrix::<f64>::try_zeros(usize::MAX / 16, 1, Layout::ColMajor),
        Err(LinalgError::AllocationFailure { .. })
    ));

    let mut m = DenseMatrix::from_fn(3, 2, |i, j| (i * 2 + j) as f64);
    let before = m.clone();
    for preserve in [false, true] {
        assert!(matches!(
            m.resize(usize::MAX, 2, preserve),
            Err(LinalgError::AllocationFailure { .. })
        ));
        assert_eq!(m, before);
        assert_eq!(m.shape(), (3, 2));
    }
    assert!(matches!(
        m.reserve(usize::MAX),
        Err(LinalgError::AllocationFailure { .. })
    ));
    assert_eq!(m, before);
}
