//! The assignment engine reports its aliasing verdicts through `tracing`.

use std::io::Write;
use std::sync::{Arc, Mutex};

use lazymat::prelude::*;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn logged(f: impl FnOnce()) -> String {
    logged_at(tracing::Level::DEBUG, f)
}

fn logged_at(level: tracing::Level, f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn verdicts_are_logged_per_path() {
    let b = DenseMatrix::<f64>::identity(4);
    let mut a = DenseMatrix::from_fn(4, 4, |i, j| (i + j) as f64);

    let out = logged(|| a.assign(b.expr().scale(2.0)).unwrap());
    assert!(out.contains("NoOverlap"), "{out}");

    let out = logged(|| a.assign_with(|a| a + &b).unwrap());
    assert!(out.contains("SafeOverlap"), "{out}");

    let out = logged(|| a.assign_with(|a| a * &b).unwrap());
    assert!(out.contains("UnsafeOverlap"), "{out}");
    assert!(out.contains("materialized temporary"), "{out}");
}

#[test]
fn fused_self_update_runs_products_through_gemm() {
    let n = 64;
    let a = DenseMatrix::from_fn(n, n, |i, j| ((i + j) % 7) as f64);
    let b = DenseMatrix::from_fn(n, n, |i, j| ((i * j) % 5) as f64 - 2.0);
    let c0 = DenseMatrix::from_fn(n, n, |i, j| (i as f64) - (j as f64));
    let mut c = c0.clone();

    let cfg = EvalConfig::blocked_always();
    let out = logged_at(tracing::Level::TRACE, || {
        c.assign_op_with(AssignOp::Set, &cfg, |c| c + a.expr() * &b).unwrap()
    });
    assert!(out.contains("SafeOverlap"), "{out}");
    assert!(out.contains("gemm"), "{out}");
    assert!(out.contains("Blocked"), "{out}");

    let expected = (c0.expr() + a.expr() * &b).evaluate_with(&cfg).unwrap();
    assert_eq!(c, expected);
}

#[test]
fn structured_and_sparse_self_reads_are_safe_overlap() {
    let mut s = DenseMatrix::<f64>::structured(3, StructuralForm::Symmetric);
    s.set(2, 0, 1.5).unwrap();
    s.set(1, 1, -2.0).unwrap();
    let out = logged(|| {
        s.assign_op_with(AssignOp::Add, &EvalConfig::default(), |this| this).unwrap()
    });
    assert!(out.contains("SafeOverlap"), "{out}");
    assert_eq!(s.get(0, 2), 3.0);
    assert_eq!(s.get(1, 1), -4.0);

    let out = logged(|| s.assign_with(|this| this.transpose() * this).unwrap());
    assert!(out.contains("UnsafeOverlap"), "{out}");

    let mut sp = SparseMatrix::<f64>::new(2, 3);
    sp.insert(1, 2, 5.0).unwrap();
    let out = logged(|| {
        sp.assign_op_with(AssignOp::Add, &EvalConfig::default(), |this| this).unwrap()
    });
    assert!(out.contains("SafeOverlap"), "{out}");
    assert_eq!(sp.get(1, 2), 10.0);
}
