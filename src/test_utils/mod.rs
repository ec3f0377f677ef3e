//! Shared helpers between unit tests.

mod common;

pub use common::*;
