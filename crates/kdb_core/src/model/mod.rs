//! In-memory record model.
//!
//! # Responsibility
//! - Define the dynamically typed column value.
//! - Define the row type tracking applied data and pending edits.
//!
//! # Invariants
//! - Rows never observe their own pending edits until they are applied.

pub mod row;
pub mod value;
