use serde::{Deserialize, Serialize};

/// Holds a table of named columns with a fixed number of rows
///
/// Element tables have one row per (element, integration point), node tables
/// have one row per mesh point.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Table {
    nrow: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    /// Allocates a new (empty) table
    pub fn new(nrow: usize) -> Self {
        Table {
            nrow,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Returns the number of rows
    pub fn nrow(&self) -> usize {
        self.nrow
    }

    /// Returns the column names
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Adds a zeroed column (or returns the index of an existing one)
    pub fn add_column(&mut self, name: &str) -> usize {
        match self.names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.columns.push(vec![0.0; self.nrow]);
                self.columns.len() - 1
            }
        }
    }

    /// Sets a value given the column index
    pub fn set(&mut self, column: usize, row: usize, value: f64) {
        self.columns[column][row] = value;
    }

    /// Adds to a value given the column index
    pub fn add(&mut self, column: usize, row: usize, value: f64) {
        self.columns[column][row] += value;
    }

    /// Returns the column with the given name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.columns[index].as_slice())
    }

    /// Returns a value given the column name
    pub fn get(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|col| col.get(row).copied())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
