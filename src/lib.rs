//! Year-sliced country statistics with closest-prior-year backfill.
//!
//! [`data::reconstruct`] is the core: for a target year it returns one row
//! per requested country, taken from that year or, failing that, from the
//! latest earlier year with data. [`views`] turns those rows into
//! chart-ready tables and [`state::Session`] ties both to a set of user
//! selections.

pub mod config;
pub mod data;
pub mod state;
pub mod views;
