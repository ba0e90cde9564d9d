//! Entity commands: get, list, put and remove.

use super::open_existing;
use entifs_core::{CoreError, Entity, EntityStore, Key, ListOptions, Order, Store};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Ordering and paging flags of `list`.
#[derive(Debug, Default)]
pub struct ListQuery {
    /// Field to order by.
    pub order_by: Option<String>,
    /// Sort largest first.
    pub desc: bool,
    /// Entities to skip.
    pub start: Option<usize>,
    /// Maximum entities to return.
    pub max: Option<usize>,
}

impl ListQuery {
    fn to_options(&self) -> ListOptions {
        let mut options = ListOptions::new().order(if self.desc {
            Order::Descending
        } else {
            Order::Ascending
        });
        if let Some(field) = &self.order_by {
            options = options.order_by(field.clone());
        }
        if let Some(start) = self.start {
            options = options.start(start);
        }
        if let Some(max) = self.max {
            options = options.max(max);
        }
        options
    }
}

fn render(entity: &Entity) -> Result<String, serde_json::Error> {
    serde_json::to_string(entity.fields())
}

/// Runs the get command.
pub fn get(path: &Path, reference: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_existing(path)?;
    let key = Key::decode(reference)?;
    match store.load_key(key)? {
        Some(entity) => println!("{}", render(&entity)?),
        None => return Err(format!("no entity {reference}").into()),
    }
    Ok(())
}

/// Loads the entities of `kind` with the query applied.
pub fn query(path: &Path, kind: &str, query: &ListQuery) -> Result<Vec<Entity>, CoreError> {
    let entities = EntityStore::new(Arc::new(open_existing(path)?));
    entities.list(kind, &query.to_options())
}

/// Runs the list command.
pub fn list(
    path: &Path,
    kind: &str,
    list_query: ListQuery,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let entities = query(path, kind, &list_query)?;

    match format {
        "json" => {
            let rows: Vec<Value> = entities
                .iter()
                .map(|e| {
                    let mut row = e.fields().clone();
                    row.insert("_key".to_string(), Value::String(e.key().to_string()));
                    Value::Object(row)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            for entity in &entities {
                println!("{:<16} {}", entity.key(), render(entity)?);
            }
            println!("({} entities)", entities.len());
        }
    }
    Ok(())
}

/// Writes an entity and returns its key.
pub fn write(path: &Path, kind: &str, json: &str, id: Option<&str>) -> Result<Key, CoreError> {
    let Value::Object(fields) = serde_json::from_str::<Value>(json)? else {
        return Err(CoreError::invalid_operation("entity fields must be a JSON object"));
    };

    let entities = EntityStore::new(Arc::new(Store::open(path)?));
    let entity = match id {
        Some(id) => Entity::new(Key::new(kind, id)?, fields),
        None => entities.create(kind, fields)?,
    };
    entities.save(&entity, None)?;
    info!(key = %entity.key(), base = %path.display(), "wrote entity");
    Ok(entity.key().clone())
}

/// Runs the put command.
pub fn put(
    path: &Path,
    kind: &str,
    json: &str,
    id: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = write(path, kind, json, id)?;
    println!("{key}");
    Ok(())
}

/// Removes the entity named by `reference`.
pub fn delete(path: &Path, reference: &str) -> Result<Key, CoreError> {
    let key = Key::decode(reference)?;
    let entities = EntityStore::new(Arc::new(open_existing(path)?));
    entities.remove(&key, None)?;
    info!(key = %key, base = %path.display(), "removed entity");
    Ok(key)
}

/// Runs the remove command.
pub fn remove(path: &Path, reference: &str) -> Result<(), Box<dyn std::error::Error>> {
    let key = delete(path, reference)?;
    println!("removed {key}");
    Ok(())
}
