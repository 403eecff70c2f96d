//! `Sync` bound that only applies with the `parallel` feature.
//!
//! Row-range closures handed to [`crate::threading`] run on rayon workers
//! under `parallel`; without it they stay on the calling thread and may
//! capture anything.

#[cfg(feature = "parallel")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "parallel")]
impl<T: Sync> MaybeSync for T {}

#[cfg(not(feature = "parallel"))]
pub trait MaybeSync {}
#[cfg(not(feature = "parallel"))]
impl<T> MaybeSync for T {}
