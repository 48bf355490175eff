//! Free-form tags attached to expenses and recurring expenses.

use std::collections::BTreeSet;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

/// A set of free-form tags, e.g. "subscription" or "shared".
///
/// Stored in the database as a JSON array so that the set round-trips through
/// a single text column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the set contains no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl ToSql for TagSet {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let json = serde_json::to_string(&self.0)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(json))
    }
}

impl FromSql for TagSet {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        // Rows written before tags existed have NULL or an empty string.
        let text = match value {
            ValueRef::Null => return Ok(Self::default()),
            value => value.as_str()?,
        };

        if text.is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(text)
            .map(Self)
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
