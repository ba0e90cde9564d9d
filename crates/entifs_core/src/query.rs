//! In-memory listing: filter, then order, then slice.

use crate::entity::Entity;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

type Filter = Box<dyn Fn(&Entity) -> bool + Send + Sync>;

/// Options for [`crate::EntityStore::list`].
///
/// Applied in a fixed order: the filter first, then ordering by a field,
/// then the `start`/`max` window. Window bounds past the end are clamped.
/// `max` of `None` means no limit and `Some(0)` means no items.
///
/// ```rust
/// use entifs_core::ListOptions;
///
/// let options = ListOptions::new()
///     .filter(|e| e.get("active") == Some(&serde_json::Value::Bool(true)))
///     .order_by("name")
///     .descending()
///     .start(10)
///     .max(10);
/// ```
#[derive(Default)]
pub struct ListOptions {
    filter: Option<Filter>,
    order_by: Option<String>,
    order: Order,
    start: Option<usize>,
    max: Option<usize>,
}

impl ListOptions {
    /// Creates options that return everything in listing order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only entities for which `filter` returns true.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Orders by the value of `field`.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Sets the sort direction.
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// Sorts largest first.
    #[must_use]
    pub fn descending(self) -> Self {
        self.order(Order::Descending)
    }

    /// Skips the first `start` entities.
    #[must_use]
    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Returns at most `max` entities.
    #[must_use]
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Applies the options to a fully materialized list.
    #[must_use]
    pub fn apply(&self, mut entities: Vec<Entity>) -> Vec<Entity> {
        if let Some(filter) = &self.filter {
            entities.retain(|entity| filter(entity));
        }

        if let Some(field) = &self.order_by {
            entities.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match self.order {
                    Order::Ascending => ord,
                    Order::Descending => ord.reverse(),
                }
            });
        }

        let len = entities.len();
        let start = self.start.unwrap_or(0).min(len);
        let end = match self.max {
            Some(max) => start.saturating_add(max).min(len),
            None => len,
        };
        entities.truncate(end);
        entities.drain(..start);
        entities
    }
}

impl fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("filter", &self.filter.is_some())
            .field("order_by", &self.order_by)
            .field("order", &self.order)
            .field("start", &self.start)
            .field("max", &self.max)
            .finish()
    }
}

/// Total order over optional JSON values used for sorting.
///
/// A missing value sorts as `null`. Values of different JSON types sort by
/// type: null, bool, number, string, array, object. Numbers compare
/// numerically and strings lexicographically; arrays and objects compare
/// equal to each other.
#[must_use]
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    let x = x.as_f64().unwrap_or(f64::NAN);
                    let y = y.as_f64().unwrap_or(f64::NAN);
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Key;
    use serde_json::json;

    fn entity(id: &str, value: Value) -> Entity {
        let Value::Object(fields) = value else {
            panic!("expected object")
        };
        Entity::new(Key::new("user", id).unwrap(), fields)
    }

    fn sample() -> Vec<Entity> {
        vec![
            entity("1", json!({"name": "carol", "age": 35})),
            entity("2", json!({"name": "alice", "age": 30})),
            entity("3", json!({"name": "bob", "age": 25})),
            entity("4", json!({"name": "dave"})),
        ]
    }

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.key().id()).collect()
    }

    #[test]
    fn no_options_keeps_listing_order() {
        assert_eq!(ids(&ListOptions::new().apply(sample())), ["1", "2", "3", "4"]);
    }

    #[test]
    fn orders_ascending_by_default() {
        let result = ListOptions::new().order_by("name").apply(sample());
        assert_eq!(ids(&result), ["2", "3", "1", "4"]);
    }

    #[test]
    fn orders_descending() {
        let result = ListOptions::new().order_by("age").descending().apply(sample());
        // missing age sorts as null, below every number
        assert_eq!(ids(&result), ["1", "2", "3", "4"]);
    }

    #[test]
    fn filter_runs_before_order_and_window() {
        let result = ListOptions::new()
            .filter(|e| e.get("age").is_some())
            .order_by("age")
            .start(1)
            .max(5)
            .apply(sample());
        assert_eq!(ids(&result), ["2", "1"]);
    }

    #[test]
    fn window_is_clamped() {
        assert!(ListOptions::new().start(10).apply(sample()).is_empty());
        assert_eq!(ids(&ListOptions::new().start(3).max(10).apply(sample())), ["4"]);
        assert_eq!(ids(&ListOptions::new().max(2).apply(sample())), ["1", "2"]);
        assert_eq!(
            ids(&ListOptions::new().start(1).max(usize::MAX).apply(sample())),
            ["2", "3", "4"]
        );
    }

    #[test]
    fn zero_max_means_no_items() {
        assert!(ListOptions::new().max(0).apply(sample()).is_empty());
    }

    #[test]
    fn sort_is_stable() {
        let entities = vec![
            entity("1", json!({"group": 1})),
            entity("2", json!({"group": 0})),
            entity("3", json!({"group": 1})),
            entity("4", json!({"group": 0})),
        ];
        let result = ListOptions::new().order_by("group").apply(entities.clone());
        assert_eq!(ids(&result), ["2", "4", "1", "3"]);
        let result = ListOptions::new().order_by("group").descending().apply(entities);
        assert_eq!(ids(&result), ["1", "3", "2", "4"]);
    }

    #[test]
    fn value_ordering() {
        assert_eq!(compare_values(None, Some(&json!(false))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(10))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!(1.5)), Some(&json!(1))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!("b")), Some(&json!("a"))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(99)), Some(&json!("1"))), Ordering::Less);
        assert_eq!(compare_values(Some(&json!([1])), Some(&json!([2]))), Ordering::Equal);
        assert_eq!(compare_values(None, Some(&Value::Null)), Ordering::Equal);
    }
}
