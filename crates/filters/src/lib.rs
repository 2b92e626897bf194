//! Declarative search-refinement filters.
//!
//! Filters describe widgets the host renders above the result list. The
//! user's selection is persisted as a [`FilterState`]: an opaque map from
//! filter identifier to a dynamic value that only the owning filter knows
//! how to read.

mod error;
mod filter;
mod rating;
mod state;

pub use error::FilterError;
pub use filter::{Filter, FilterBase, FilterDisplayHints, FilterOption};
pub use rating::RatingFilter;
pub use state::FilterState;
