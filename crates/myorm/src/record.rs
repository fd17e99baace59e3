//! Active-record style rows: a [`Row`] plus the table it belongs to, its
//! primary key and the set of columns changed since it was loaded.
//!
//! ```ignore
//! let mut user = Record::new("users").with_primary_key(["id"]);
//! user.set("name", "alice");
//! user.save(&client).await?;            // insert into users set name = ?
//!
//! let mut user = Record::find(&client, "users", "id", 7).await?;
//! user.set("status", "inactive");
//! user.save(&client).await?;            // update users set status = ? where id = ?
//! ```

use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::qb::Query;
use crate::row::{FromValue, Row};
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    table: String,
    primary_key: Vec<String>,
    hidden: BTreeSet<String>,
    values: Row,
    /// Values as last loaded or saved; the primary key is matched against these.
    stored: Row,
    dirty: BTreeSet<String>,
    is_new: bool,
}

impl Record {
    /// A record that has not been stored yet; `save` inserts it.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: Vec::new(),
            hidden: BTreeSet::new(),
            values: Row::new(),
            stored: Row::new(),
            dirty: BTreeSet::new(),
            is_new: true,
        }
    }

    /// Wrap a row loaded from `table`; `save` updates it.
    pub fn from_existing(table: impl Into<String>, row: Row) -> Self {
        Self {
            stored: row.clone(),
            values: row,
            is_new: false,
            ..Self::new(table)
        }
    }

    pub fn with_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns left out of [`Record::visible`] and serialization.
    pub fn with_hidden<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Assign a column and mark it dirty.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        self.values.insert(column.clone(), value);
        self.dirty.insert(column);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        self.values.try_get(column)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether anything changed since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.is_new || !self.dirty.is_empty()
    }

    pub fn dirty_columns(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn row(&self) -> &Row {
        &self.values
    }

    pub fn into_row(self) -> Row {
        self.values
    }

    /// The row without hidden columns.
    pub fn visible(&self) -> Row {
        self.values
            .iter()
            .filter(|(column, _)| !self.hidden.contains(*column))
            .map(|(column, value)| (column, value.clone()))
            .collect()
    }

    fn key_query(&self) -> OrmResult<Query> {
        if self.primary_key.is_empty() {
            return Err(OrmError::MissingPrimaryKey(self.table.clone()));
        }
        let mut query = Query::new(self.table.as_str());
        for column in &self.primary_key {
            let value = match self.stored.get(column) {
                Some(value) if !value.is_null() => value.clone(),
                _ => {
                    return Err(OrmError::validation(format!(
                        "primary key column '{column}' of '{}' has no value",
                        self.table
                    )));
                }
            };
            query = query.where_eq(column, value);
        }
        Ok(query)
    }

    /// Insert a new record or update the dirty columns of a loaded one.
    ///
    /// Updates match the primary key as it was stored, so a changed key
    /// column is written rather than used to find the row.
    ///
    /// Returns `None` when there was nothing to write. After an insert, a
    /// generated id is stored in the first primary key column if it has no
    /// value yet.
    pub async fn save(&mut self, conn: &impl GenericClient) -> OrmResult<Option<ExecResult>> {
        let result = if self.is_new {
            let query = self
                .values
                .iter()
                .fold(Query::new(self.table.as_str()), |q, (column, value)| {
                    q.set(column, value.clone())
                });
            let result = query.insert(conn).await?;
            if let Some(id) = result.and_then(|r| r.last_insert_id) {
                self.fill_generated_key(id);
            }
            if result.is_some() {
                self.is_new = false;
            }
            result
        } else {
            if self.dirty.is_empty() {
                return Ok(None);
            }
            let query = self.dirty.iter().try_fold(self.key_query()?, |q, column| {
                let value = self.values.get(column).cloned().unwrap_or(Value::Null);
                Ok::<_, OrmError>(q.set(column, value))
            })?;
            Some(query.update(conn).await?)
        };

        if result.is_some() {
            self.dirty.clear();
            self.stored = self.values.clone();
        }
        Ok(result)
    }

    fn fill_generated_key(&mut self, id: u64) {
        if let Some(column) = self.primary_key.first() {
            let missing = self.values.get(column).is_none_or(Value::is_null);
            if missing {
                self.values.insert(column.clone(), Value::UInt(id));
            }
        }
    }

    /// Delete the stored row identified by the primary key.
    pub async fn delete(&self, conn: &impl GenericClient) -> OrmResult<ExecResult> {
        if self.is_new {
            return Err(OrmError::validation(format!(
                "cannot delete an unsaved '{}' record",
                self.table
            )));
        }
        self.key_query()?.delete(conn).await
    }

    /// Load the row whose `key_column` equals `value`.
    pub async fn find(
        conn: &impl GenericClient,
        table: &str,
        key_column: &str,
        value: impl Into<Value>,
    ) -> OrmResult<Record> {
        let value = value.into();
        let row = Query::new(table)
            .where_eq(key_column, value.clone())
            .first(conn)
            .await?
            .ok_or_else(|| {
                OrmError::not_found(format!("no '{table}' row with {key_column} = {value}"))
            })?;
        Ok(Record::from_existing(table, row).with_primary_key([key_column]))
    }

    /// Load the first row matching every pair, or build an unsaved record
    /// holding the pairs.
    pub async fn first_or_new<I, K, V>(
        conn: &impl GenericClient,
        table: &str,
        pairs: I,
    ) -> OrmResult<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let pairs: Vec<(String, Value)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let found = Query::new(table)
            .where_map(pairs.iter().cloned())
            .first(conn)
            .await?;

        Ok(match found {
            Some(row) => Record::from_existing(table, row),
            None => {
                let mut record = Record::new(table);
                for (column, value) in pairs {
                    record.set(column, value);
                }
                record
            }
        })
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.visible().serialize(serializer)
    }
}
