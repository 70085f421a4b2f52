//! Tree Module
//!
//! Ordered per-shard storage.
//!
//! ## Responsibilities
//! - O(log n) insert, delete and lookup keyed by string
//! - In-order traversal for checkpoint snapshots
//! - Self-check of the red-black invariants (used by tests)
//!
//! ## Data Structure Choice
//! A red-black tree stored in an arena (`Vec` of nodes addressed by index):
//! - Child and parent links are plain indices, so the parent back-reference
//!   owns nothing and there are no ownership cycles
//! - Freed slots are recycled through a free list
//! - Keys compare bytewise, which is lexical order for UTF-8 strings

mod rbtree;

pub use rbtree::{Color, Iter, RbTree};
