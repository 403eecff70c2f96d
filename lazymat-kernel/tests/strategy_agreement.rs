//! Scalar, blocked and (when compiled in) external kernels must agree.

use approx::assert_relative_eq;
use lazymat_kernel::{
    gemm, hadamard, scaled_copy, EvalConfig, Mode, Operand, Strategy,
};
use lazymat_storage::{DenseMatrix, Layout};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random(rng: &mut StdRng, rows: usize, cols: usize, layout: Layout) -> DenseMatrix<f64> {
    DenseMatrix::from_fn_with_layout(rows, cols, layout, |_, _| rng.gen_range(-1.0..1.0))
}

fn random_complex(rng: &mut StdRng, rows: usize, cols: usize) -> DenseMatrix<Complex64> {
    DenseMatrix::from_fn(rows, cols, |_, _| {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

fn assert_close(a: &DenseMatrix<f64>, b: &DenseMatrix<f64>) {
    assert_eq!(a.shape(), b.shape());
    for i in 0..a.rows() {
        for j in 0..a.columns() {
            assert_relative_eq!(a.get(i, j), b.get(i, j), max_relative = 1e-9, epsilon = 1e-12);
        }
    }
}

#[test]
fn gemm_scalar_and_blocked_agree_across_threshold() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let threshold = EvalConfig::default().vectorize_threshold;
    // m * n * k around the default vectorize threshold, plus larger panels.
    let sizes = [(2, 3, 4), (6, 6, 7), (7, 6, 7), (17, 19, 23), (64, 40, 300)];
    for &(m, k, n) in &sizes {
        for (la, lb) in [
            (Layout::RowMajor, Layout::RowMajor),
            (Layout::ColMajor, Layout::RowMajor),
            (Layout::RowMajor, Layout::ColMajor),
        ] {
            let a = random(&mut rng, m, k, la);
            let b = random(&mut rng, k, n, lb);
            let c0 = random(&mut rng, m, n, Layout::RowMajor);

            let mut scalar = c0.clone();
            let s = gemm(
                &mut scalar.view_mut().unwrap(),
                1.5,
                &Operand::Dense(a.view()),
                &Operand::Dense(b.view()),
                Mode::Add,
                &EvalConfig::scalar_only(),
            )
            .unwrap();
            assert_eq!(s, Strategy::Scalar);

            let mut fast = c0.clone();
            let s = gemm(
                &mut fast.view_mut().unwrap(),
                1.5,
                &Operand::Dense(a.view()),
                &Operand::Dense(b.view()),
                Mode::Add,
                &EvalConfig::default(),
            )
            .unwrap();
            if m * n * k < threshold {
                assert_eq!(s, Strategy::Scalar);
            } else {
                assert_ne!(s, Strategy::Scalar);
            }
            assert_close(&scalar, &fast);
        }
    }
}

#[test]
fn gemm_external_or_fallback_matches_scalar() {
    let mut rng = StdRng::seed_from_u64(11);
    let cfg = EvalConfig {
        external: true,
        external_threshold: 1,
        vectorize_threshold: 1,
        ..EvalConfig::default()
    };
    let a = random(&mut rng, 12, 9, Layout::ColMajor);
    let b = random(&mut rng, 9, 5, Layout::RowMajor);
    for dest_layout in [Layout::RowMajor, Layout::ColMajor] {
        for mode in [Mode::Set, Mode::Add, Mode::Sub] {
            let c0 = random(&mut rng, 12, 5, dest_layout);
            let mut expected = c0.clone();
            gemm(
                &mut expected.view_mut().unwrap(),
                -0.5,
                &Operand::Dense(a.view()),
                &Operand::Dense(b.view()),
                mode,
                &EvalConfig::scalar_only(),
            )
            .unwrap();
            let mut got = c0.clone();
            let s = gemm(
                &mut got.view_mut().unwrap(),
                -0.5,
                &Operand::Dense(a.view()),
                &Operand::Dense(b.view()),
                mode,
                &cfg,
            )
            .unwrap();
            if !lazymat_kernel::external_available() {
                assert_eq!(s, Strategy::Blocked);
            }
            assert_close(&expected, &got);
        }
    }
}

#[test]
fn complex_gemm_agrees() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_complex(&mut rng, 20, 30);
    let b = random_complex(&mut rng, 30, 10);
    let mut scalar = DenseMatrix::<Complex64>::zeros(20, 10);
    let mut fast = DenseMatrix::<Complex64>::zeros(20, 10);
    let alpha = Complex64::new(0.5, -1.0);
    for (dest, cfg) in [
        (&mut scalar, EvalConfig::scalar_only()),
        (&mut fast, EvalConfig::blocked_always()),
    ] {
        gemm(
            &mut dest.view_mut().unwrap(),
            alpha,
            &Operand::Dense(a.view()),
            &Operand::Dense(b.view()),
            Mode::Set,
            &cfg,
        )
        .unwrap();
    }
    for (x, y) in scalar.as_slice().iter().zip(fast.as_slice()) {
        assert_relative_eq!(x.re, y.re, max_relative = 1e-9, epsilon = 1e-12);
        assert_relative_eq!(x.im, y.im, max_relative = 1e-9, epsilon = 1e-12);
    }
}

#[test]
fn elementwise_kernels_agree() {
    let mut rng = StdRng::seed_from_u64(21);
    for &(rows, cols) in &[(3, 5), (16, 16), (100, 70)] {
        let a = random(&mut rng, rows, cols, Layout::RowMajor);
        let b = random(&mut rng, rows, cols, Layout::RowMajor);
        let c0 = random(&mut rng, rows, cols, Layout::RowMajor);

        let mut scalar = c0.clone();
        let mut fast = c0.clone();
        for (dest, cfg) in [
            (&mut scalar, EvalConfig::scalar_only()),
            (&mut fast, EvalConfig::blocked_always()),
        ] {
            scaled_copy(&mut dest.view_mut().unwrap(), 2.0, &a.view(), Mode::Sub, &cfg).unwrap();
            hadamard(&mut dest.view_mut().unwrap(), -0.5, &a.view(), &b.view(), Mode::Add, &cfg).unwrap();
        }
        assert_close(&scalar, &fast);
    }
}

#[test]
fn mixed_layout_elementwise_uses_scalar_loop() {
    let a = DenseMatrix::from_fn_with_layout(32, 32, Layout::ColMajor, |i, j| (i * 32 + j) as f64);
    let mut c = DenseMatrix::<f64>::zeros(32, 32);
    let s = scaled_copy(
        &mut c.view_mut().unwrap(),
        1.0,
        &a.view(),
        Mode::Set,
        &EvalConfig::blocked_always(),
    )
    .unwrap();
    assert_eq!(s, Strategy::Scalar);
    assert_eq!(c.get(5, 7), (5 * 32 + 7) as f64);
}
