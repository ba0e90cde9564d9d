//! Benchmark support for EntiFS.

pub mod utils;
