//! Shared traits and storage descriptors for the lazymat crates.
//!
//! `lazymat-storage`, `lazymat-kernel` and the top-level `lazymat` crate all
//! agree on element bounds ([`Scalar`]), lazily applied element operations
//! ([`ElementOp`]) and the descriptor vocabulary ([`Layout`],
//! [`StructuralForm`], [`StorageKind`]) defined here.

pub mod descriptor;
pub mod element_op;
pub mod scalar;

pub use descriptor::{Access, Descriptor, Layout, StorageKind, StructuralForm, Uplo};
pub use element_op::{ElementOp, ElementOpApply};
pub use scalar::Scalar;
