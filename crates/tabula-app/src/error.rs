// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error as ThisError;

use crate::validation::ColumnIssue;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum GridError {
    #[error("cannot reach database: {0}")]
    Connection(String),

    #[error("schema lookup failed: {0}")]
    Schema(String),

    #[error("table `{0}` has no columns")]
    EmptyResult(String),

    #[error("expected {expected} values, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("invalid input:\n{}", render_issues(.0))]
    Validation(Vec<ColumnIssue>),

    #[error("duplicate row skipped: {0}")]
    Duplicate(String),

    #[error("database write failed: {0}")]
    Persistence(String),

    #[error("invalid identifier {0:?}; use letters, digits and underscores only")]
    InvalidIdentifier(String),

    #[error("unknown table `{0}`")]
    UnknownTable(String),
}

impl GridError {
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type GridResult<T> = std::result::Result<T, GridError>;

fn render_issues(issues: &[ColumnIssue]) -> String {
    issues
        .iter()
        .map(ColumnIssue::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
