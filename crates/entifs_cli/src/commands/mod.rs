//! CLI command implementations.

pub mod entity;
pub mod inspect;
pub mod verify;

use entifs_core::{Config, CoreResult, Store};
use std::path::Path;

/// Opens an existing store without creating anything.
pub(crate) fn open_existing(path: &Path) -> CoreResult<Store> {
    Store::open_with_config(path, Config::new().create_if_missing(false))
}
