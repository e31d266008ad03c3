use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::construct::GroupKey;

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Predicate `{predicate}` failed at {location}: {reason}")]
    PredicateEvaluation {
        predicate: String,
        location: Location,
        reason: EvalError,
    },
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Options could not be loaded: {0}")]
    Load(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, HighlightError>;

// Helper conversions
impl From<config::ConfigError> for HighlightError {
    fn from(e: config::ConfigError) -> Self {
        Self::Load(e.to_string())
    }
}

/// Failure raised by a single predicate evaluation, before it is tied to a
/// predicate and a location by the evaluator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("expected 1 value, got {0}")]
    Shape(usize),
    #[error("{0}")]
    Failed(String),
}

/// Where a predicate was being evaluated when it failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Location {
    /// Checking referenced columns against the schema, before any rows are touched.
    Binding,
    Group { facet: GroupKey, group: GroupKey },
    Row { facet: GroupKey, row: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Binding => write!(f, "binding"),
            Location::Group { facet, group } if facet.is_empty() => write!(f, "group {group}"),
            Location::Group { facet, group } => write!(f, "facet {facet}, group {group}"),
            Location::Row { facet, row } if facet.is_empty() => write!(f, "row {row}"),
            Location::Row { facet, row } => write!(f, "facet {facet}, row {row}"),
        }
    }
}

/// Grouped evaluation produced something other than one value per group, so the
/// predicate set was evaluated row-wise instead. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupingFallback {
    pub facet: GroupKey,
    pub grouping: Vec<String>,
    pub predicate: String,
    pub group: GroupKey,
    pub produced: usize,
}

impl fmt::Display for GroupingFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tried to evaluate `{}` grouped by [{}] but group {} produced {} values; \
             fell back to row-wise evaluation",
            self.predicate,
            self.grouping.join(", "),
            self.group,
            self.produced
        )
    }
}
