//! Destination aliasing analysis.
//!
//! Every leaf of an expression records the buffer it reads, the element
//! mapping of that read and whether the path from the root reaches it only
//! through element-wise nodes (`+`, `-`, negation, scaling, conjugation,
//! Hadamard). [`analyze`] compares those leaves against a destination that
//! is written element by element; [`analyze_indirect`] against structured or
//! sparse storage, which is only ever written through a temporary.

use lazymat_storage::{BufferSpan, Mapping, ReadKey, Scalar};
use smallvec::SmallVec;

use crate::expr::{Expr, Node};

/// How an expression's operands overlap the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasVerdict {
    /// No leaf shares memory with the destination.
    NoOverlap,
    /// Every overlapping leaf reads element `(i, j)` exactly where the
    /// destination writes `(i, j)`, and only through element-wise nodes.
    SafeOverlap,
    /// Some overlapping leaf is read under a product, transpose, window or
    /// with a different mapping.
    UnsafeOverlap,
}

/// One leaf read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LeafAccess {
    pub span: BufferSpan,
    /// `None` for sparse, structured or otherwise irregular reads.
    pub mapping: Option<Mapping>,
    pub key: ReadKey,
    pub elementwise: bool,
}

pub(crate) type Leaves = SmallVec<[LeafAccess; 8]>;

pub(crate) fn collect<T: Scalar>(expr: &Expr<'_, T>, elementwise: bool, out: &mut Leaves) {
    match expr.node() {
        Node::Dense(v) => out.push(LeafAccess {
            span: v.span(),
            mapping: v.mapping(),
            key: v.read_key(),
            elementwise,
        }),
        Node::Sparse(v) => out.push(LeafAccess {
            span: v.span(),
            mapping: None,
            key: v.read_key(),
            elementwise,
        }),
        Node::Target(_) | Node::Invalid(_) => {}
        Node::Add(l, r) | Node::Sub(l, r) | Node::Hadamard(l, r) => {
            collect(l, elementwise, out);
            collect(r, elementwise, out);
        }
        Node::Neg(x) | Node::Scale(_, x) | Node::Conj(x) => collect(x, elementwise, out),
        Node::Product(l, r) => {
            collect(l, false, out);
            collect(r, false, out);
        }
        Node::Transpose(x) => collect(x, false, out),
        Node::Submatrix { inner, .. } => collect(inner, false, out),
        Node::Cast(src) => src.collect_leaves(out),
    }
}

/// Classify how `expr` reads the memory written through `dest`.
///
/// `dest_mapping` is the element mapping of the write; `None` means the
/// destination is written indirectly, so any overlap is unsafe; use
/// [`analyze_indirect`] to recognize exact self-reads of such storage.
pub fn analyze<T: Scalar>(dest: BufferSpan, dest_mapping: Option<Mapping>, expr: &Expr<'_, T>) -> AliasVerdict {
    classify(dest, expr, |leaf| dest_mapping.is_some() && leaf.mapping == dest_mapping)
}

/// Classify how `expr` reads a destination whose current contents are read
/// as `dest_read`.
///
/// A leaf with the same [`ReadKey`] sees every element exactly as the
/// destination stores it, so `S += S` on a symmetric or sparse `S` is a safe
/// overlap; any other read of the destination's memory is unsafe.
pub fn analyze_indirect<T: Scalar>(dest: BufferSpan, dest_read: ReadKey, expr: &Expr<'_, T>) -> AliasVerdict {
    classify(dest, expr, |leaf| leaf.key == dest_read)
}

/// Read key of a container leaf.
pub(crate) fn leaf_key<T: Scalar>(expr: &Expr<'_, T>) -> Option<ReadKey> {
    match expr.node() {
        Node::Dense(v) => Some(v.read_key()),
        Node::Sparse(v) => Some(v.read_key()),
        _ => None,
    }
}

fn classify<T: Scalar>(dest: BufferSpan, expr: &Expr<'_, T>, exact: impl Fn(&LeafAccess) -> bool) -> AliasVerdict {
    let mut leaves = Leaves::new();
    collect(expr, true, &mut leaves);
    let mut verdict = AliasVerdict::NoOverlap;
    for leaf in leaves.iter().filter(|leaf| leaf.span.overlaps(&dest)) {
        if !(leaf.elementwise && exact(leaf)) {
            return AliasVerdict::UnsafeOverlap;
        }
        verdict = AliasVerdict::SafeOverlap;
    }
    verdict
}
