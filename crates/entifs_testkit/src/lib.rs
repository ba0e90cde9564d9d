//! # EntiFS Testkit
//!
//! Test utilities for EntiFS.
//!
//! This crate provides:
//! - Temporary store fixtures
//! - Property-based test generators using proptest
//! - A fault-injecting filesystem for commit failure tests
//! - A model-checked integration harness
//! - Multi-threaded stress helpers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entifs_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|entities| {
//!         let user = entities.create("user", fields_of(json!({"name": "Alice"})))?;
//!         entities.save(&user, None)
//!     })
//!     .unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use faulty::*;
pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
