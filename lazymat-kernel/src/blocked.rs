//! Blocked kernels for dense general operands.
//!
//! Element-wise kernels walk buffers that share one linear element order (see
//! [`select_strategy`](crate::select_strategy)) in fixed-size chunks through
//! raw pointers, so a source that is the destination itself is read before
//! the same slot is written.
//!
//! The matrix product packs a `KC`-deep panel of `B` (transposed, so each
//! output column reads a contiguous run) and the matching panel of `A`, then
//! computes every output element of the panel as a contiguous dot product.
//! Row blocks of the output are independent and fan out over rayon.

use lazymat_storage::{try_filled, MatrixMut, MatrixRef, Result};

use crate::config::EvalConfig;
use crate::maybe_sync::MaybeSync;
use crate::simd::{dispatch_if_large, slice_dot};
use crate::threading::{for_each_range, SendConstPtr, SendPtr, Split};
use crate::{naive, KernelScalar, Mode};

/// Elements per chunk of the element-wise loops.
pub const CHUNK: usize = 256;
/// Depth of one packed panel of a matrix product.
pub const KC: usize = 256;
/// Output rows per parallel task of a matrix product.
pub const MC: usize = 32;

// ============================================================================
// Element-wise
// ============================================================================

/// Whether raw linear index `i` of `src` holds the same logical element as
/// linear index `i` of `dest`.
fn same_linear_order<T>(dest: &MatrixRef<'_, T>, src: &MatrixRef<'_, T>) -> bool {
    if !src.is_plain() {
        return false;
    }
    if dest.is_empty() {
        return true;
    }
    match (dest.contiguous_layout(), src.contiguous_layout()) {
        (Some(d), Some(s)) => d == s || dest.rows() <= 1 || dest.cols() <= 1,
        _ => false,
    }
}

fn run_elementwise<T, F>(dest: &mut MatrixMut<'_, T>, mode: Mode, cfg: &EvalConfig, value: F)
where
    T: KernelScalar,
    F: Fn(usize) -> T + MaybeSync,
{
    let len = dest.rows() * dest.cols();
    let dst = SendPtr(dest.as_mut_ptr());
    let split = Split {
        grain: CHUNK * 8,
        cost_per_index: 1,
        min_work: cfg.parallel_threshold,
    };
    for_each_range(len, split, cfg.parallel, &|range: std::ops::Range<usize>| {
        let d = dst.get();
        let mut start = range.start;
        while start < range.end {
            let end = (start + CHUNK).min(range.end);
            dispatch_if_large(end - start, || unsafe {
                match mode {
                    Mode::Set => {
                        for i in start..end {
                            *d.add(i) = value(i);
                        }
                    }
                    Mode::Add => {
                        for i in start..end {
                            *d.add(i) = *d.add(i) + value(i);
                        }
                    }
                    Mode::Sub => {
                        for i in start..end {
                            *d.add(i) = *d.add(i) - value(i);
                        }
                    }
                }
            });
            start = end;
        }
    });
}

/// `dest op= alpha * src` over buffers with a common contiguous order.
///
/// Falls back to the scalar loop unless every buffer is one gap-free run in
/// the same order.
pub fn scaled_copy<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    src: &MatrixRef<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) {
    if !same_linear_order(&dest.rb(), src) {
        return naive::scaled_copy(dest, alpha, src, mode);
    }
    let s = SendConstPtr(src.as_ptr());
    if alpha == T::one() {
        run_elementwise(dest, mode, cfg, move |i| unsafe { *s.get().add(i) })
    } else {
        run_elementwise(dest, mode, cfg, move |i| alpha * unsafe { *s.get().add(i) })
    }
}

/// `dest op= alpha * (a .* b)` over buffers with a common contiguous order.
///
/// Falls back to the scalar loop unless every buffer is one gap-free run in
/// the same order.
pub fn hadamard<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) {
    let d = dest.rb();
    if !same_linear_order(&d, a) || !same_linear_order(&d, b) {
        return naive::hadamard(dest, alpha, a, b, mode);
    }
    let pa = SendConstPtr(a.as_ptr());
    let pb = SendConstPtr(b.as_ptr());
    run_elementwise(dest, mode, cfg, move |i| unsafe {
        alpha * (*pa.get().add(i) * *pb.get().add(i))
    })
}

// ============================================================================
// Matrix product
// ============================================================================

/// `dest op= alpha * a * b` with packed panels.
///
/// Operands may have any strides; packing reads through the views. The
/// destination must not overlap `a` or `b`.
pub fn gemm<T: KernelScalar>(
    dest: &mut MatrixMut<'_, T>,
    alpha: T,
    a: &MatrixRef<'_, T>,
    b: &MatrixRef<'_, T>,
    mode: Mode,
    cfg: &EvalConfig,
) -> Result<()> {
    let (m, k) = a.shape();
    let n = b.cols();
    if m == 0 || n == 0 {
        return Ok(());
    }
    if k == 0 {
        if mode == Mode::Set {
            dest.fill(T::zero());
        }
        return Ok(());
    }

    let kc_max = k.min(KC);
    let mut a_pack = try_filled(m * kc_max, T::zero())?;
    let mut b_pack = try_filled(n * kc_max, T::zero())?;
    let (rs, cs) = (dest.row_stride(), dest.col_stride());
    let dst = SendPtr(dest.as_mut_ptr());

    let mut pc = 0;
    while pc < k {
        let kc = (k - pc).min(KC);
        // Row-major A panel (m x kc) and transposed B panel (n x kc).
        for i in 0..m {
            for p in 0..kc {
                a_pack[i * kc + p] = unsafe { a.get_unchecked(i, pc + p) };
            }
        }
        for j in 0..n {
            for p in 0..kc {
                b_pack[j * kc + p] = unsafe { b.get_unchecked(pc + p, j) };
            }
        }
        let panel_mode = if pc == 0 { mode } else { mode.then() };

        let a_panel = &a_pack[..m * kc];
        let b_panel = &b_pack[..n * kc];
        let split = Split {
            grain: MC,
            cost_per_index: n * kc,
            min_work: cfg.parallel_threshold,
        };
        for_each_range(m, split, cfg.parallel, &|rows: std::ops::Range<usize>| {
            let c = dst.get();
            for i in rows {
                let arow = &a_panel[i * kc..(i + 1) * kc];
                for j in 0..n {
                    let d = slice_dot(arow, &b_panel[j * kc..(j + 1) * kc]);
                    unsafe {
                        let slot = c.offset(i as isize * rs + j as isize * cs);
                        *slot = panel_mode.combine(*slot, alpha * d);
                    }
                }
            }
        });
        pc += kc;
    }
    Ok(())
}
