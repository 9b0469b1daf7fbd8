// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::error::{GridError, GridResult};
use crate::model::Row;

/// Rows of one table in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    column_count: usize,
    rows: Vec<Row>,
}

impl RowStore {
    pub fn new(column_count: usize) -> Self {
        Self {
            column_count,
            rows: Vec::new(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }

    pub fn insert(&mut self, row: Row) -> GridResult<()> {
        if row.len() != self.column_count {
            return Err(GridError::Shape {
                expected: self.column_count,
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Removes the rows at `indices`, highest first so lower indices stay
    /// valid. Out-of-range indices are ignored.
    pub fn delete_at(&mut self, indices: &BTreeSet<usize>) -> usize {
        let mut removed = 0;
        for index in indices.iter().rev() {
            if self.remove(*index).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn remove(&mut self, index: usize) -> Option<Row> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::RowStore;
    use crate::error::GridError;
    use anyhow::Result;
    use std::collections::BTreeSet;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn insert_appends_and_keeps_order() -> Result<()> {
        let mut store = RowStore::new(2);
        store.insert(row(&["Alice", "30"]))?;
        store.insert(row(&["Bob", "25"]))?;

        assert_eq!(store.count(), 2);
        assert_eq!(store.rows()[0], row(&["Alice", "30"]));
        assert_eq!(store.rows()[1], row(&["Bob", "25"]));
        Ok(())
    }

    #[test]
    fn insert_rejects_wrong_shape() {
        let mut store = RowStore::new(3);
        let error = store
            .insert(row(&["only", "two"]))
            .expect_err("short row should fail");
        assert_eq!(
            error,
            GridError::Shape {
                expected: 3,
                actual: 2
            }
        );
        assert!(store.is_empty());
    }

    #[test]
    fn delete_at_ignores_out_of_range_indices() -> Result<()> {
        let mut store = RowStore::new(1);
        for value in ["a", "b", "c", "d"] {
            store.insert(row(&[value]))?;
        }

        let removed = store.delete_at(&BTreeSet::from([0, 2, 9]));
        assert_eq!(removed, 2);
        assert_eq!(store.rows(), &[row(&["b"]), row(&["d"])]);

        assert_eq!(store.delete_at(&BTreeSet::from([5])), 0);
        assert_eq!(store.count(), 2);
        Ok(())
    }

    #[test]
    fn clear_empties_the_store() -> Result<()> {
        let mut store = RowStore::new(1);
        store.insert(row(&["x"]))?;
        store.clear();
        assert_eq!(store.count(), 0);
        assert!(store.get(0).is_none());
        Ok(())
    }
}
