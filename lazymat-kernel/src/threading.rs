//! Rayon fan-out over disjoint index ranges.
//!
//! Blocked kernels split their output into ranges (element chunks or row
//! blocks) that never overlap, and hand each range to a worker through
//! [`for_each_range`]. Raw destination pointers cross threads as [`SendPtr`].

use std::ops::Range;

use crate::maybe_sync::MaybeSync;

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// Users must guarantee that the pointee outlives every parallel task and
/// that concurrent tasks write disjoint elements.
pub(crate) struct SendPtr<T>(pub(crate) *mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    #[inline(always)]
    pub(crate) fn get(self) -> *mut T {
        self.0
    }
}

/// Read-only counterpart of [`SendPtr`].
pub(crate) struct SendConstPtr<T>(pub(crate) *const T);

impl<T> Clone for SendConstPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendConstPtr<T> {}

unsafe impl<T> Send for SendConstPtr<T> {}
unsafe impl<T> Sync for SendConstPtr<T> {}

impl<T> SendConstPtr<T> {
    #[inline(always)]
    pub(crate) fn get(self) -> *const T {
        self.0
    }
}

/// Default minimum work (in elements) before splitting into parallel tasks.
pub(crate) const MINTHREADLENGTH: usize = 1 << 15;

/// How a range of indices is split across rayon tasks.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Split {
    /// Smallest range worth its own task.
    pub(crate) grain: usize,
    /// Elements of work per index (row length for row blocks).
    pub(crate) cost_per_index: usize,
    /// Ranges with at most this much work run on the current thread.
    pub(crate) min_work: usize,
}

/// Call `f` on consecutive sub-ranges covering `0..len`, in parallel when
/// `parallel` is set.
pub(crate) fn for_each_range<F>(len: usize, split: Split, parallel: bool, f: &F)
where
    F: Fn(Range<usize>) + MaybeSync,
{
    if len == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    {
        if parallel && rayon::current_num_threads() > 1 {
            split_join(0..len, &split, f);
            return;
        }
    }
    let _ = (split, parallel);
    f(0..len);
}

#[cfg(feature = "parallel")]
fn split_join<F>(range: Range<usize>, split: &Split, f: &F)
where
    F: Fn(Range<usize>) + Sync,
{
    let n = range.end - range.start;
    if n <= split.grain.max(1) || n.saturating_mul(split.cost_per_index) <= split.min_work {
        f(range);
        return;
    }
    let mid = range.start + n / 2;
    rayon::join(
        || split_join(range.start..mid, split, f),
        || split_join(mid..range.end, split, f),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_ranges_cover_exactly_once() {
        let hits: Vec<AtomicUsize> = (0..100_000).map(|_| AtomicUsize::new(0)).collect();
        let split = Split {
            grain: 1024,
            cost_per_index: 1,
            min_work: 4096,
        };
        for_each_range(hits.len(), split, true, &|r: Range<usize>| {
            for i in r {
                hits[i].fetch_add(1, Ordering::Relaxed);
            }
        });
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_sequential_single_call() {
        let calls = Mutex::new(Vec::new());
        let split = Split {
            grain: 1,
            cost_per_index: 1,
            min_work: 0,
        };
        for_each_range(10, split, false, &|r: Range<usize>| {
            calls.lock().unwrap().push(r);
        });
        assert_eq!(calls.into_inner().unwrap(), vec![0..10]);
    }

    #[test]
    fn test_empty_range_never_calls() {
        let calls = AtomicUsize::new(0);
        let split = Split {
            grain: 1,
            cost_per_index: 1,
            min_work: MINTHREADLENGTH,
        };
        for_each_range(0, split, true, &|_r: Range<usize>| {
            calls.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_send_ptr_roundtrip() {
        let mut x = 5i32;
        let p = SendPtr(&mut x as *mut i32);
        unsafe { *p.get() = 7 };
        assert_eq!(x, 7);
        let c = SendConstPtr(&x as *const i32);
        assert_eq!(unsafe { *c.get() }, 7);
    }
}
