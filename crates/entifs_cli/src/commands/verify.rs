//! Verify command implementation.

use super::open_existing;
use entifs_core::Store;
use std::path::{Path, PathBuf};
use tracing::info;

/// Store verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Number of entity files that loaded as JSON objects.
    pub valid_entities: usize,
    /// Entity files that failed to load, with the reason.
    pub invalid_entities: Vec<(String, String)>,
    /// Staged files left in the base directory.
    pub staged_files: Vec<PathBuf>,
    /// Staged files removed by `--clean`.
    pub cleaned: usize,
}

impl VerifyResult {
    /// Returns true if every entity is valid and no staged file remains.
    pub fn is_ok(&self) -> bool {
        self.invalid_entities.is_empty() && self.staged_files.len() == self.cleaned
    }
}

/// Loads every entity of every kind and lists staged leftovers.
pub fn verify(store: &Store, clean: bool) -> Result<VerifyResult, Box<dyn std::error::Error>> {
    let mut result = VerifyResult::default();

    for kind in store.kinds()? {
        for key in store.retrieve_all(&kind)? {
            let reference = key.to_string();
            match store.load_key(key) {
                Ok(Some(_)) => result.valid_entities += 1,
                // removed while verifying
                Ok(None) => {}
                Err(err) => result.invalid_entities.push((reference, err.to_string())),
            }
        }
    }

    result.staged_files = store.staged_files()?;
    if clean && !result.staged_files.is_empty() {
        result.cleaned = store.clean_staged()?;
        info!(removed = result.cleaned, base = %store.base().display(), "removed staged files");
    }

    Ok(result)
}

/// Runs the verify command.
pub fn run(path: &Path, clean: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    println!("Verifying store: {}", path.display());
    println!();

    let result = verify(&store, clean)?;

    println!("Entities: {} valid", result.valid_entities);
    for (reference, reason) in &result.invalid_entities {
        println!("  ✗ {reference}: {reason}");
    }

    if result.staged_files.is_empty() {
        println!("Staged files: none");
    } else {
        println!("Staged files: {}", result.staged_files.len());
        for file in &result.staged_files {
            println!("  {}", file.display());
        }
        if clean {
            println!("Removed {} staged files", result.cleaned);
        }
    }

    println!();
    if result.is_ok() {
        println!("✓ Store verification passed");
        Ok(())
    } else {
        Err("store verification failed".into())
    }
}
