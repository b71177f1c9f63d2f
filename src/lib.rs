//! Order-statistic containers and a disease case monitor built on them.
//!
//! This crate provides three generic containers and one store that composes them:
//!
//! - [`OrderedSet`] - a weight-balanced search tree with subtree sizes, answering
//!   [`count_less_than`](OrderedSet::count_less_than),
//!   [`count_greater_than`](OrderedSet::count_greater_than) and ranked lookups in O(log n)
//!   and extracting a closed range in O(log n + m)
//! - [`IndexableHeap`] - a binary max-heap whose [`HeapNode`] handles let callers
//!   re-prioritize or remove any element in O(log n)
//! - [`HashMap`] - a separate-chaining hash map growing through a table of near-prime
//!   capacities
//! - [`Monitor`] - a multi-index store of [`Record`]s serving date-range, count and
//!   top-k-disease queries
//!
//! # Example
//!
//! ```
//! use wabi_monitor::{OrderedSet, Rank};
//!
//! let mut dates = OrderedSet::new();
//! dates.insert("2020-03-01");
//! dates.insert("2020-01-15");
//! dates.insert("2020-02-10");
//!
//! // Order-statistic operations (O(log n))
//! assert_eq!(dates.count_less_than(&"2020-02-10"), 1);
//! assert_eq!(dates.count_greater_than(&"2020-01-31"), 2);
//! assert_eq!(dates[Rank(0)], "2020-01-15");
//!
//! // Inclusive range extraction
//! let february = dates.return_from_to(Some(&"2020-02-01"), Some(&"2020-02-29"));
//! assert_eq!(february, [&"2020-02-10"]);
//! ```
//!
//! # Handles
//!
//! [`SetNode`] and [`HeapNode`] carry the slot, the slot's generation and the id of the
//! container that issued them. A handle whose element was removed, or one shown to another
//! container, is detected: lookups return `None` and mutations return
//! [`Error::StaleHandle`].
//!
//! # Ownership
//!
//! Containers own whatever `T` they hold. An `OrderedSet<Record>` drops records when they
//! are removed; an `OrderedSet<&Record>` is a view that never frees anything. [`Monitor`]
//! stores `&Record`, so callers keep their records.

#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod error;
mod order_statistic;
mod raw;

pub mod comparator;
pub mod hash_map;
pub mod heap;
pub mod monitor;
pub mod ordered_set;

pub use comparator::{Comparator, Natural};
pub use error::{Error, Result};
pub use hash_map::HashMap;
pub use heap::{HeapNode, IndexableHeap};
pub use monitor::{Monitor, MonitorConfig, Record};
pub use order_statistic::Rank;
pub use ordered_set::{OrderedSet, SetNode};
