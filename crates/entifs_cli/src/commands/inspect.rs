//! Inspect command implementation.

use super::open_existing;
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store base directory.
    pub path: String,
    /// Per-kind statistics.
    pub kinds: Vec<KindStats>,
    /// Total number of entities.
    pub entity_count: usize,
    /// Staged files left in the base directory.
    pub staged_files: Vec<String>,
}

/// Statistics for a single kind.
#[derive(Debug, Serialize)]
pub struct KindStats {
    /// Kind name.
    pub kind: String,
    /// Number of entities.
    pub entity_count: usize,
}

/// Collects statistics for the store at `path`.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = open_existing(path)?;

    let mut kinds = Vec::new();
    for kind in store.kinds()? {
        let entity_count = store.count(&kind)?;
        kinds.push(KindStats { kind, entity_count });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        entity_count: kinds.iter().map(|k| k.entity_count).sum(),
        kinds,
        staged_files: store
            .staged_files()?
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("EntiFS Store: {}", result.path);
    println!("==========================================");
    println!();
    println!("Kinds: {}", result.kinds.len());
    for kind in &result.kinds {
        println!("  {:<24} {:>8} entities", kind.kind, kind.entity_count);
    }
    println!();
    println!("Total entities: {}", result.entity_count);

    if !result.staged_files.is_empty() {
        println!();
        println!("Staged files ({}):", result.staged_files.len());
        for file in &result.staged_files {
            println!("  {file}");
        }
        println!("Run `entifs verify --clean` to remove them.");
    }
}
