//! Algebraic and aliasing properties of expression evaluation and assignment.

use approx::assert_relative_eq;
use lazymat::prelude::*;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

fn random(rng: &mut StdRng, rows: usize, cols: usize) -> DenseMatrix<f64> {
    DenseMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-1.0..1.0))
}

fn assert_close(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) {
    assert_eq!(a.shape(), b.shape());
    for i in 0..a.rows() {
        for j in 0..a.columns() {
            assert_relative_eq!(a.get(i, j), b.get(i, j), max_relative = 1e-9, epsilon = 1e-12);
        }
    }
}

/// Matrix of `form` filled with small integers that respect the form.
fn structured(n: usize, form: StructuralForm) -> DenseMatrix<f64> {
    let mut m = DenseMatrix::structured(n, form);
    for i in 0..n {
        for j in 0..n {
            let v = (1 + i * n + j) as f64;
            // implied positions reject anything but their implied value
            let _ = m.set(i, j, v);
        }
    }
    m
}

#[test]
fn addition_is_associative_within_tolerance() {
    let mut rng = StdRng::seed_from_u64(1);
    let (a, b, c) = (random(&mut rng, 9, 7), random(&mut rng, 9, 7), random(&mut rng, 9, 7));
    let left = ((a.expr() + &b) + &c).evaluate().unwrap();
    let right = (a.expr() + (b.expr() + &c)).evaluate().unwrap();
    assert_close(&left, &right);
}

#[test]
fn adding_the_negation_is_exactly_zero() {
    let mut rng = StdRng::seed_from_u64(2);
    let a = random(&mut rng, 13, 11);
    let z = (a.expr() + (-a.expr())).evaluate().unwrap();
    assert!(z.as_slice().iter().all(|&x| x == 0.0));

    let mut d = a.clone();
    d.assign_with(|this| this + (-this)).unwrap();
    assert!(d.as_slice().iter().all(|&x| x == 0.0));
}

#[test]
fn self_assignment_matches_independent_copy_for_every_form() {
    for form in StructuralForm::ALL {
        let original = structured(4, form);

        let mut a = original.clone();
        a.assign_with(|this| this).unwrap();
        assert_eq!(a, original, "{form:?}: A = A");

        let copy = original.clone();
        let mut a = original.clone();
        let mut b = original.clone();
        let self_result = a.assign_op_with(AssignOp::Add, &EvalConfig::default(), |this| this);
        let copy_result = b.assign_add(&copy);
        assert_eq!(self_result.is_ok(), copy_result.is_ok(), "{form:?}: A += A");
        assert_eq!(a, b, "{form:?}: A += A");
        assert_eq!(a.form(), form);
    }
}

#[test]
fn self_assignment_matches_independent_copy_for_sparse() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut s = SparseMatrix::<f64>::new(8, 6);
    for _ in 0..15 {
        let (i, j) = (rng.gen_range(0..8), rng.gen_range(0..6));
        s.set(i, j, rng.gen_range(1.0..2.0)).unwrap();
    }

    let mut a = s.clone();
    a.assign_with(|this| this).unwrap();
    assert_eq!(a.iter().collect::<Vec<_>>(), s.iter().collect::<Vec<_>>());

    let copy = s.clone();
    let mut a = s.clone();
    let mut b = s.clone();
    a.assign_op_with(AssignOp::Add, &EvalConfig::default(), |this| this).unwrap();
    b.assign_add(&copy).unwrap();
    assert_eq!(a.iter().collect::<Vec<_>>(), b.iter().collect::<Vec<_>>());
    assert_eq!(a.get(0, 0), 2.0 * s.get(0, 0));
}

#[test]
fn self_product_matches_explicit_temporary() {
    let mut rng = StdRng::seed_from_u64(4);
    for n in [3, 17, 64] {
        let a = random(&mut rng, n, n);
        let t = (a.expr() * &a).evaluate().unwrap();
        let mut expected = a.clone();
        expected.assign(&t).unwrap();

        let mut got = a.clone();
        got.assign_with(|this| this * this).unwrap();
        assert_close(&got, &expected);

        let mut compound = a.clone();
        compound.assign_mul(&a).unwrap();
        assert_close(&compound, &expected);
    }
}

#[test]
fn product_plus_self_through_fixed_destination() {
    let a = StaticMatrix::<f64, 3, 3>::from_fn(|i, j| (i + 2 * j) as f64);
    let mut s = a;
    s.assign_with(|this| this * this + this).unwrap();
    let expected = (a.expr() * &a + &a).evaluate().unwrap();
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(s.get(i, j), expected.get(i, j));
        }
    }
}

#[test]
fn transpose_is_an_involution() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random(&mut rng, 5, 8);
    let leaf = a.expr().transpose().transpose().evaluate().unwrap();
    assert_eq!(leaf, a);
    let composite = a.expr().scale(0.5).transpose().transpose();
    let composite = composite.evaluate().unwrap();
    for (x, y) in composite.as_slice().iter().zip(a.as_slice()) {
        assert_eq!(*x, 0.5 * y);
    }

    let z = DenseMatrix::from_fn(3, 2, |i, j| Complex64::new(i as f64, j as f64 + 1.0));
    assert_eq!(z.expr().adjoint().adjoint().evaluate().unwrap(), z);
}

#[test]
fn symmetric_write_reads_back_mirrored_last_write_wins() {
    let mut s = DenseMatrix::<f64>::structured(5, StructuralForm::Symmetric);
    s.set(1, 4, 3.0).unwrap();
    assert_eq!(s.get(4, 1), 3.0);
    s.set(4, 1, -7.0).unwrap();
    assert_eq!(s.get(1, 4), -7.0);
    assert_eq!(s.get(4, 1), -7.0);
}

#[test]
fn congruence_commits_into_symmetric_destination() {
    let mut rng = StdRng::seed_from_u64(11);
    for n in [3, 6, 40] {
        let mut src = DenseMatrix::<f64>::structured(n, StructuralForm::Symmetric);
        for i in 0..n {
            for j in 0..=i {
                src.set(i, j, rng.gen_range(-1.0..1.0)).unwrap();
            }
        }
        let b = random(&mut rng, n, n);
        let expected = (b.expr().transpose() * &src * &b).evaluate().unwrap();

        let mut s = DenseMatrix::<f64>::structured(n, StructuralForm::Symmetric);
        s.assign(b.expr().transpose() * &src * &b).unwrap();
        assert_eq!(s.form(), StructuralForm::Symmetric);
        assert!(s.is_symmetric());
        for i in 0..n {
            for j in 0..=i {
                assert_relative_eq!(s.get(i, j), expected.get(i, j), max_relative = 1e-9, epsilon = 1e-12);
                assert_eq!(s.get(j, i), s.get(i, j));
            }
        }
    }
}

#[test]
fn congruence_commits_into_hermitian_destination() {
    let mut rng = StdRng::seed_from_u64(12);
    let z = |rng: &mut StdRng| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    for n in [3, 6, 40] {
        let mut src = DenseMatrix::<Complex64>::structured(n, StructuralForm::Hermitian);
        for i in 0..n {
            src.set(i, i, Complex64::new(rng.gen_range(-1.0..1.0), 0.0)).unwrap();
            for j in 0..i {
                src.set(i, j, z(&mut rng)).unwrap();
            }
        }
        let b = DenseMatrix::from_fn(n, n, |_, _| z(&mut rng));
        let expected = (b.expr().adjoint() * &src * &b).evaluate().unwrap();

        let mut h = DenseMatrix::<Complex64>::structured(n, StructuralForm::Hermitian);
        h.assign(b.expr().adjoint() * &src * &b).unwrap();
        assert_eq!(h.form(), StructuralForm::Hermitian);
        assert!(h.is_hermitian());
        for i in 0..n {
            assert_eq!(h.get(i, i).im, 0.0);
            assert_relative_eq!(h.get(i, i).re, expected.get(i, i).re, max_relative = 1e-9, epsilon = 1e-12);
            assert!(expected.get(i, i).im.abs() < 1e-9);
            for j in 0..i {
                let (got, want) = (h.get(i, j), expected.get(i, j));
                assert_relative_eq!(got.re, want.re, max_relative = 1e-9, epsilon = 1e-12);
                assert_relative_eq!(got.im, want.im, max_relative = 1e-9, epsilon = 1e-12);
                assert_eq!(h.get(j, i), got.conj());
            }
        }
    }
}

#[test]
fn mismatched_product_fails_without_touching_destination() {
    let a = DenseMatrix::<f64>::filled(2, 3, 1.0);
    let b = DenseMatrix::<f64>::filled(2, 2, 1.0);
    let mut c = DenseMatrix::from_fn(2, 2, |i, j| (i * 2 + j) as f64);
    let before = c.clone();

    let err = c.assign(a.expr() * &b).unwrap_err();
    assert_eq!(err, LinalgError::ShapeMismatch((2, 3), (2, 2)));
    assert_eq!(c, before);
    assert!(c.assign_add(a.expr() * &b).is_err());
    assert!(c.assign_with(|this| this * &a * &b).is_err());
    assert_eq!(c, before);
}

#[test]
fn scalar_and_blocked_assignment_agree_across_threshold() {
    let mut rng = StdRng::seed_from_u64(6);
    let blocked = EvalConfig::blocked_always();
    let scalar = EvalConfig::scalar_only();
    for n in [2, 5, 7, 16, 33, 80] {
        let a = random(&mut rng, n, n + 1);
        let b = random(&mut rng, n + 1, n);
        let c = random(&mut rng, n, n);
        let run = |cfg: &EvalConfig| {
            let mut out = DenseMatrix::<f64>::zeros(n, n);
            out.assign_configured((a.expr() * &b).scale(1.5) - c.expr().hadamard(&c), cfg)
                .unwrap();
            out
        };
        assert_close(&run(&scalar), &run(&blocked));
        assert_close(&run(&scalar), &run(&EvalConfig::default()));
    }
}

#[test]
fn sparse_random_insertion_is_sorted_unique_and_exact() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut positions: Vec<(usize, usize)> = (0..20).flat_map(|i| (0..20).map(move |j| (i, j))).collect();
    positions.shuffle(&mut rng);
    positions.truncate(60);

    let mut s = SparseMatrix::<f64>::new(20, 20);
    for &(i, j) in &positions {
        s.insert(i, j, (i * 20 + j) as f64 + 0.25).unwrap();
    }
    let entries: Vec<_> = s.iter().collect();
    assert_eq!(entries.len(), positions.len());
    assert!(entries.windows(2).all(|w| (w[0].0, w[0].1) < (w[1].0, w[1].1)));
    assert!(entries.iter().all(|&(i, j, v)| v == (i * 20 + j) as f64 + 0.25));

    // through an expression and back: the same entries survive
    let mut t = SparseMatrix::<f64>::new(1, 1);
    t.assign(s.expr().transpose().transpose()).unwrap();
    assert_eq!(t.iter().collect::<Vec<_>>(), entries);
}

#[test]
fn sparse_dense_products_match_dense_reference() {
    let mut rng = StdRng::seed_from_u64(8);
    let mut s = SparseMatrix::<f64>::with_layout(12, 9, Layout::ColMajor);
    for _ in 0..30 {
        s.set(rng.gen_range(0..12), rng.gen_range(0..9), rng.gen_range(-1.0..1.0)).unwrap();
    }
    let d = random(&mut rng, 9, 4);
    let sd = s.to_dense();

    let mut got = DenseMatrix::<f64>::zeros(12, 4);
    got.assign(s.expr() * &d).unwrap();
    let expected = (sd.expr() * &d).evaluate_with(&EvalConfig::scalar_only()).unwrap();
    assert_close(&got, &expected);

    let mut gram = DenseMatrix::<f64>::zeros(0, 0);
    gram.assign(s.expr().transpose() * &s).unwrap();
    let expected = (sd.expr().transpose() * &sd).evaluate().unwrap();
    assert_close(&gram, &expected);
}

#[test]
fn vector_products_and_reductions() {
    let x = DenseVector::from_vec(vec![1.0, -2.0, 0.5]);
    let y = DenseVector::from_vec(vec![4.0, 1.0, 2.0]);
    let inner = (x.expr().transpose() * &y).evaluate().unwrap();
    assert_eq!(inner.shape(), (1, 1));
    assert_eq!(inner.get(0, 0), x.expr().dot(&y).unwrap());

    let outer = (x.expr() * y.expr().transpose()).evaluate().unwrap();
    assert_eq!(outer.shape(), (3, 3));
    assert_eq!(outer.get(1, 0), -8.0);
    assert_eq!((x.expr() * &y).sum().unwrap(), 4.0 - 2.0 + 1.0);

    let mut v = StaticVector::<f64, 3>::zeros();
    v.assign(2.0 * x.expr() - &y).unwrap();
    assert_eq!(v.as_slice(), &[-2.0, -5.0, -1.0]);
}

#[test]
fn global_config_is_set_once() {
    // Either this call or an earlier one installed the configuration.
    let _ = EvalConfig::default().install_global();
    assert!(EvalConfig::default().install_global().is_err());
}
