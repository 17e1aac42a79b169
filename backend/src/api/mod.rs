//! API module shared helpers.

pub mod common;
