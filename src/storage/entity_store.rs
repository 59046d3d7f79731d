/// Generic CRUD and query primitive shared by every entity type
///
/// Records are JSON objects. Sorting and filtering work on the JSON form so a
/// caller can order or match on any field by name; results are decoded into
/// the typed entity on the way out.

use std::cmp::Ordering;
use std::marker::PhantomData;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::timestamp;
use crate::storage::{Entity, RecordStore, StorageError, StoredRow};

/// Default maximum number of records returned by [`EntityStore::list`]
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Fields owned by the store; callers cannot set them through create or update
const MANAGED_FIELDS: [&str; 3] = ["id", "created_date", "updated_date"];

/// Ordering request: a field name, optionally prefixed with `-` for descending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

impl SortOrder {
    pub fn parse(text: &str) -> Self {
        match text.trim().strip_prefix('-') {
            Some(field) => Self { field: field.to_string(), descending: true },
            None => Self { field: text.trim().to_string(), descending: false },
        }
    }

    pub fn desc(field: &str) -> Self {
        Self { field: field.to_string(), descending: true }
    }

    pub fn asc(field: &str) -> Self {
        Self { field: field.to_string(), descending: false }
    }
}

/// Exact-equality conjunction over record fields
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    terms: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(mut self, field: &str, value: Value) -> Self {
        self.terms.push((field.to_string(), value));
        self
    }

    /// Require `field == value` when a value is given; ignore the field otherwise
    pub fn eq_opt(self, field: &str, value: Option<Value>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// A record missing a required field does not match
    pub fn matches(&self, record: &Map<String, Value>) -> bool {
        self.terms
            .iter()
            .all(|(field, wanted)| record.get(field) == Some(wanted))
    }
}

/// Typed view of one entity table
pub struct EntityStore<'a, S, T> {
    store: &'a S,
    _entity: PhantomData<T>,
}

impl<'a, S: RecordStore, T: Entity> EntityStore<'a, S, T> {
    pub fn new(store: &'a S) -> Self {
        Self { store, _entity: PhantomData }
    }

    /// All records ordered by `sort`, truncated to `limit` (default 100).
    ///
    /// Without a sort, records come back in insertion order. The sort is stable
    /// so ties keep insertion order.
    pub fn list(&self, sort: Option<&SortOrder>, limit: Option<usize>) -> Result<Vec<T>, StorageError> {
        let mut records = self.load_all()?;

        if let Some(order) = sort {
            records.sort_by(|a, b| {
                let ordering = compare_field(a.get(&order.field), b.get(&order.field));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        Ok(self.decode_all(records, limit.unwrap_or(DEFAULT_LIST_LIMIT)))
    }

    /// Records matching every term of `criteria`, in insertion order
    pub fn filter(&self, criteria: &Criteria) -> Result<Vec<T>, StorageError> {
        let records = self
            .load_all()?
            .into_iter()
            .filter(|record| criteria.matches(record))
            .collect();

        Ok(self.decode_all(records, usize::MAX))
    }

    /// The record with `id`, or `None` when it does not exist
    pub fn get(&self, id: T::Id) -> Result<Option<T>, StorageError> {
        match self.store.fetch_row(T::TABLE, &id.to_string())? {
            Some(row) => Ok(Some(serde_json::from_str(&row.body)?)),
            None => Ok(None),
        }
    }

    /// Persist a new record built from the entity defaults overlaid with `data`.
    ///
    /// The store assigns the id and timestamps and returns the stored record.
    pub fn create(&self, data: &impl Serialize) -> Result<T, StorageError> {
        let mut body = T::defaults();
        body.extend(Self::object_of(data)?);

        let now = timestamp::format(&Utc::now());
        body.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        body.insert("created_date".to_string(), Value::String(now.clone()));
        if T::TRACKS_UPDATED {
            body.insert("updated_date".to_string(), Value::String(now));
        } else {
            body.remove("updated_date");
        }

        let entity: T = serde_json::from_value(Value::Object(body))?;
        let row = Self::row_of(&entity)?;
        self.store.insert_row(T::TABLE, &row)?;

        debug!("Created {} {}", T::NAME, row.id);
        Ok(entity)
    }

    /// Shallow-merge `patch` into the stored record and stamp `updated_date`.
    ///
    /// The merged record must still decode as the entity. Fails with
    /// `NotFound` when no record has `id`.
    pub fn update(&self, id: T::Id, patch: &impl Serialize) -> Result<T, StorageError> {
        let key = id.to_string();
        let row = self
            .store
            .fetch_row(T::TABLE, &key)?
            .ok_or_else(|| StorageError::NotFound { entity: T::NAME, id: key.clone() })?;

        let mut body = match serde_json::from_str::<Value>(&row.body)? {
            Value::Object(body) => body,
            _ => return Err(Self::invalid("stored body is not an object")),
        };
        body.extend(Self::object_of(patch)?);
        if T::TRACKS_UPDATED {
            body.insert(
                "updated_date".to_string(),
                Value::String(timestamp::format(&Utc::now())),
            );
        }

        let entity: T = serde_json::from_value(Value::Object(body))?;
        let row = Self::row_of(&entity)?;
        if !self.store.replace_row(T::TABLE, &row)? {
            return Err(StorageError::NotFound { entity: T::NAME, id: key });
        }

        debug!("Updated {} {}", T::NAME, row.id);
        Ok(entity)
    }

    /// Remove the record; deleting a missing id is not an error
    pub fn delete(&self, id: T::Id) -> Result<(), StorageError> {
        self.store.remove_row(T::TABLE, &id.to_string())?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Map<String, Value>>, StorageError> {
        let rows = self.store.fetch_rows(T::TABLE)?;
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            match serde_json::from_str::<Value>(&row.body) {
                Ok(Value::Object(record)) => records.push(record),
                Ok(_) => warn!("Skipping {} {}: body is not an object", T::NAME, row.id),
                Err(e) => warn!("Skipping {} {}: {}", T::NAME, row.id, e),
            }
        }

        Ok(records)
    }

    fn decode_all(&self, records: Vec<Map<String, Value>>, limit: usize) -> Vec<T> {
        records
            .into_iter()
            .filter_map(|record| {
                let id = record.get("id").cloned().unwrap_or(Value::Null);
                match serde_json::from_value(Value::Object(record)) {
                    Ok(entity) => Some(entity),
                    Err(e) => {
                        warn!("Skipping undecodable {} {}: {}", T::NAME, id, e);
                        None
                    }
                }
            })
            .take(limit)
            .collect()
    }

    fn object_of(data: &impl Serialize) -> Result<Map<String, Value>, StorageError> {
        match serde_json::to_value(data)? {
            Value::Object(mut fields) => {
                for managed in MANAGED_FIELDS {
                    fields.remove(managed);
                }
                Ok(fields)
            }
            _ => Err(Self::invalid("data must serialize to an object")),
        }
    }

    fn row_of(entity: &T) -> Result<StoredRow, StorageError> {
        let value = serde_json::to_value(entity)?;
        let text_field = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

        let created_date = text_field("created_date")
            .ok_or_else(|| Self::invalid("record has no created_date"))?;

        Ok(StoredRow {
            id: entity.id().to_string(),
            created_date,
            updated_date: text_field("updated_date"),
            body: value.to_string(),
        })
    }

    fn invalid(reason: &str) -> StorageError {
        StorageError::InvalidRecord { entity: T::NAME, reason: reason.to_string() }
    }
}

/// Order two field values; a missing or null field sorts as the number zero.
///
/// Numbers compare numerically, strings lexically (ISO dates and timestamps
/// therefore compare chronologically) and booleans false before true. Values
/// of different kinds order by kind.
pub fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let zero = Value::from(0);
    let a = a.filter(|v| !v.is_null()).unwrap_or(&zero);
    let b = b.filter(|v| !v.is_null()).unwrap_or(&zero);

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
