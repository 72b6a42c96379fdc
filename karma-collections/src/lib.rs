//! Small, predictable collections for bounded and ordered data.
//!
//! This crate provides three structures that keep their bookkeeping explicit
//! instead of hiding it behind amortized growth:
//!
//! ```text
//! Container<T>      - bounded dedup set, every element carries an insertion stamp
//! PriorityVec<T>    - insertion-ordered storage, priority-ordered view
//! IndexedMap<K, V>  - map with stable positional access in insertion order
//! ```
//!
//! # Design Philosophy
//!
//! Ordering is a *view* concern, not a storage concern. All three types keep
//! their backing storage in insertion order and derive sorted or positional
//! views on demand:
//!
//! - [`Container`] remembers *when* each element arrived and can reconcile
//!   two containers by most-recent stamp ([`Container::merge`]).
//! - [`PriorityVec`] never reorders its slots; [`PriorityVec::sorted`] and
//!   the cursor walk a computed permutation.
//! - [`IndexedMap`] answers both `get(&key)` and `get_index(pos)` without
//!   giving up either.
//!
//! Capacity is a hard contract, not a hint. A full [`Container`] hands the
//! rejected value back in [`Full`] rather than reallocating behind the
//! caller's back.
//!
//! # Quick Start
//!
//! ```
//! use karma_collections::Container;
//!
//! let mut recent: Container<&str> = Container::new(8);
//!
//! assert_eq!(recent.try_insert("alpha"), Ok(true));
//! assert_eq!(recent.try_insert("alpha"), Ok(false)); // deduplicated
//! assert!(recent.contains(&"alpha"));
//!
//! assert_eq!(recent.remove(&"alpha"), Some("alpha"));
//! assert!(!recent.contains(&"alpha"));
//! ```
//!
//! # Thread Safety
//!
//! None of these types synchronize internally. They are `Send`/`Sync` exactly
//! when their element types are; wrap them in a lock to share across threads.

#![warn(missing_docs)]

pub mod container;
pub mod indexed;
pub mod priority;

pub use container::{Container, Full, Stamp};
pub use indexed::IndexedMap;
pub use priority::{PriorityCollection, PriorityVec};
