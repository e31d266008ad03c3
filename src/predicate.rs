use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::construct::{Frame, Schema};
use crate::datatype::Value;
use crate::error::{EvalError, HighlightError, Location, Result};

/// Whether a predicate decides by truth (`Logical`) or by ranking (`Orderable`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateKind {
    Logical,
    Orderable,
}

impl PredicateKind {
    /// The kind shared by every predicate in the list. Mixing kinds, or passing
    /// no predicates at all, is a configuration error.
    pub fn common(predicates: &[Predicate]) -> Result<PredicateKind> {
        let first = predicates.first().ok_or_else(|| {
            HighlightError::Configuration("at least one predicate is required".to_string())
        })?;
        match predicates.iter().find(|p| p.kind != first.kind) {
            Some(other) => Err(HighlightError::Configuration(format!(
                "predicates must all be of one kind: `{}` is {} but `{}` is {}",
                first.source, first.kind, other.source, other.kind
            ))),
            None => Ok(first.kind),
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateKind::Logical => write!(f, "logical"),
            PredicateKind::Orderable => write!(f, "orderable"),
        }
    }
}

type Evaluator = dyn Fn(&Frame<'_>) -> std::result::Result<Vec<Value>, EvalError> + Send + Sync;

/// A source-text label plus a pure function over a frame of rows.
///
/// The function returns either one value (an aggregate over the frame) or one
/// value per row. Logical predicates must produce booleans (or missing).
#[derive(Clone)]
pub struct Predicate {
    source: String,
    kind: PredicateKind,
    columns: Vec<String>,
    evaluator: Arc<Evaluator>,
}

impl Predicate {
    pub fn new<S, I, C, F>(source: S, kind: PredicateKind, columns: I, evaluator: F) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
        F: Fn(&Frame<'_>) -> std::result::Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
            evaluator: Arc::new(evaluator),
        }
    }
    pub fn logical<S, I, C, F>(source: S, columns: I, evaluator: F) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
        F: Fn(&Frame<'_>) -> std::result::Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    {
        Self::new(source, PredicateKind::Logical, columns, evaluator)
    }
    pub fn orderable<S, I, C, F>(source: S, columns: I, evaluator: F) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
        F: Fn(&Frame<'_>) -> std::result::Result<Vec<Value>, EvalError> + Send + Sync + 'static,
    {
        Self::new(source, PredicateKind::Orderable, columns, evaluator)
    }

    /// Row-level logical predicate: does the text column match the pattern?
    pub fn matches(column: impl Into<String>, pattern: &str) -> Result<Self> {
        let column = column.into();
        let regex = Regex::new(pattern).map_err(|e| {
            HighlightError::Configuration(format!("invalid pattern '{}': {}", pattern, e))
        })?;
        let source = format!("matches({}, {:?})", column, pattern);
        let name = column.clone();
        Ok(Self::logical(source, [column], move |frame| {
            frame
                .column(&name)?
                .into_iter()
                .map(|v| match v {
                    Value::Missing => Ok(Value::Missing),
                    Value::Text(s) => Ok(Value::Boolean(regex.is_match(s))),
                    other => Err(EvalError::TypeMismatch(format!(
                        "matches() needs text, column '{}' holds {}",
                        name,
                        other.data_type()
                    ))),
                })
                .collect()
        }))
    }

    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn kind(&self) -> PredicateKind {
        self.kind
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Checks the referenced columns against a schema before any row is evaluated.
    pub fn bind(&self, schema: &Schema) -> Result<()> {
        match self.columns.iter().find(|c| !schema.contains(c)) {
            Some(missing) => Err(HighlightError::PredicateEvaluation {
                predicate: self.source.clone(),
                location: Location::Binding,
                reason: EvalError::UnknownColumn(missing.clone()),
            }),
            None => Ok(()),
        }
    }

    /// Runs the predicate over a frame, checking that logical predicates yield booleans.
    pub fn evaluate(&self, frame: &Frame<'_>) -> std::result::Result<Vec<Value>, EvalError> {
        let values = (self.evaluator)(frame)?;
        if self.kind == PredicateKind::Logical {
            if let Some(bad) = values
                .iter()
                .find(|v| !matches!(v, Value::Boolean(_) | Value::Missing))
            {
                return Err(EvalError::TypeMismatch(format!(
                    "logical predicate produced {} '{}'",
                    bad.data_type(),
                    bad
                )));
            }
        }
        Ok(values)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("columns", &self.columns)
            .finish()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
