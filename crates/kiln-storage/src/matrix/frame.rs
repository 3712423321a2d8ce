//! In-memory matrix representation.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ColumnMismatchKind, StorageError, StorageResult};

/// Composite row key: `(entity, as-of)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexKey {
    pub entity_id: i64,
    pub as_of_date: NaiveDateTime,
}

impl IndexKey {
    pub fn new(entity_id: i64, as_of_date: NaiveDateTime) -> Self {
        Self {
            entity_id,
            as_of_date,
        }
    }
}

/// Label values in row order. `None` marks a missing label.
pub type Labels = Vec<Option<f64>>;

/// Feature table indexed by the composite key.
///
/// Values are row-major; `rows[i][j]` is feature `columns[j]` of row
/// `index[i]`. Equality is exact, so a NaN cell never compares equal.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    index_names: (String, String),
    index: Vec<IndexKey>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl DesignMatrix {
    /// Build a design matrix. Every row must have one value per column.
    pub fn new(
        index_names: (String, String),
        index: Vec<IndexKey>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(index.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            index_names,
            index,
            columns,
            rows,
        }
    }

    pub fn index_names(&self) -> (&str, &str) {
        (&self.index_names.0, &self.index_names.1)
    }

    pub fn index(&self) -> &[IndexKey] {
        &self.index
    }

    /// Feature column names, in stored order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.rows.get(i).map(Vec::as_slice)
    }

    /// Values of one feature column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[j]).collect())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct as-of dates, date-only, ascending.
    pub fn as_of_dates(&self) -> Vec<NaiveDate> {
        self.index
            .iter()
            .map(|k| k.as_of_date.date())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct entities.
    pub fn num_entities(&self) -> usize {
        self.index
            .iter()
            .map(|k| k.entity_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// The first row as a one-row matrix.
    pub fn head(&self) -> Option<DesignMatrix> {
        let key = *self.index.first()?;
        let row = self.rows.first()?.clone();
        Some(Self {
            index_names: self.index_names.clone(),
            index: vec![key],
            columns: self.columns.clone(),
            rows: vec![row],
        })
    }

    /// Reorder feature columns to exactly `requested`.
    ///
    /// `requested` must be a permutation of the stored columns. Checks run in
    /// order: too few names, too many names, different membership.
    pub fn with_sorted_columns<S: AsRef<str>>(&self, requested: &[S]) -> StorageResult<Self> {
        let requested: Vec<String> = requested.iter().map(|s| s.as_ref().to_string()).collect();
        let mismatch = |kind| StorageError::ColumnMismatch {
            kind,
            requested: requested.clone(),
            actual: self.columns.clone(),
        };

        if requested.len() < self.columns.len() {
            return Err(mismatch(ColumnMismatchKind::Subset));
        }
        if requested.len() > self.columns.len() {
            return Err(mismatch(ColumnMismatchKind::Superset));
        }

        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let have: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        if wanted != have {
            return Err(mismatch(ColumnMismatchKind::Mismatch));
        }

        let positions: Vec<usize> = requested
            .iter()
            .map(|name| self.columns.iter().position(|c| c == name))
            .collect::<Option<_>>()
            .ok_or_else(|| mismatch(ColumnMismatchKind::Mismatch))?;

        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&j| row[j]).collect())
            .collect();

        Ok(Self {
            index_names: self.index_names.clone(),
            index: self.index.clone(),
            columns: requested,
            rows,
        })
    }
}

/// A decoded matrix: features plus labels, sharing one row order.
#[derive(Debug, Clone)]
pub struct LoadedMatrix {
    pub design_matrix: Arc<DesignMatrix>,
    pub labels: Arc<Labels>,
    pub label_name: String,
}
