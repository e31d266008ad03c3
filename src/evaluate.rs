//! Applies predicates per group, or per row when there is no grouping.
//!
//! Grouped evaluation expects every predicate to reduce a group to a single
//! value. When a predicate returns anything else (typically one value per row,
//! e.g. `value > 20`), or itself fails with [`EvalError::Shape`], the grouping
//! assumption does not hold for this predicate set, and the whole set is
//! evaluated row-wise instead. That retry is an
//! explicit branch returning a [`GroupingFallback`] rather than an error.

use std::slice;

use serde::Serialize;
use tracing::{debug, warn};

use crate::construct::{Dataset, GroupKey};
use crate::datatype::Value;
use crate::error::{EvalError, GroupingFallback, HighlightError, Location, Result};
use crate::predicate::{Predicate, PredicateKind};

/// What a decision is about: a whole group, or a single row in row-wise mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Subject {
    Group(GroupKey),
    Row(usize),
}

/// How grouping is used when evaluating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingMode {
    /// Try grouped, fall back to row-wise on a shape mismatch.
    Auto,
    /// Grouped only; a shape mismatch is an error.
    Grouped,
    /// Never group.
    RowWise,
}

impl From<Option<bool>> for GroupingMode {
    fn from(use_group_by: Option<bool>) -> Self {
        match use_group_by {
            None => GroupingMode::Auto,
            Some(true) => GroupingMode::Grouped,
            Some(false) => GroupingMode::RowWise,
        }
    }
}

/// One predicate result per predicate for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub subject: Subject,
    /// Dataset rows belonging to the subject, in dataset order.
    pub rows: Vec<usize>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub kind: PredicateKind,
    /// Columns actually grouped by; empty when evaluation was row-wise.
    pub grouping: Vec<String>,
    pub records: Vec<EvaluationRecord>,
    pub fallback: Option<GroupingFallback>,
}

enum GroupedAttempt {
    Complete(Vec<EvaluationRecord>),
    ShapeMismatch(GroupingFallback),
}

/// Evaluates `predicates` over the given rows of `dataset`.
///
/// `facet` only labels locations and fallbacks; the caller has already
/// restricted `rows` to that facet.
pub fn evaluate(
    dataset: &Dataset,
    rows: &[usize],
    facet: &GroupKey,
    grouping: &[String],
    predicates: &[Predicate],
    mode: GroupingMode,
) -> Result<Evaluation> {
    let kind = PredicateKind::common(predicates)?;
    if grouping.is_empty() || mode == GroupingMode::RowWise {
        return Ok(Evaluation {
            kind,
            grouping: Vec::new(),
            records: evaluate_rows(dataset, rows, facet, predicates)?,
            fallback: None,
        });
    }
    match evaluate_grouped(dataset, rows, facet, grouping, predicates)? {
        GroupedAttempt::Complete(records) => {
            debug!(groups = records.len(), facet = %facet, "grouped evaluation complete");
            Ok(Evaluation {
                kind,
                grouping: grouping.to_vec(),
                records,
                fallback: None,
            })
        }
        GroupedAttempt::ShapeMismatch(fallback) if mode == GroupingMode::Grouped => {
            Err(HighlightError::PredicateEvaluation {
                predicate: fallback.predicate,
                location: Location::Group {
                    facet: fallback.facet,
                    group: fallback.group,
                },
                reason: EvalError::Shape(fallback.produced),
            })
        }
        GroupedAttempt::ShapeMismatch(fallback) => {
            warn!(%fallback, "grouped evaluation failed, falling back to row-wise evaluation");
            Ok(Evaluation {
                kind,
                grouping: Vec::new(),
                records: evaluate_rows(dataset, rows, facet, predicates)?,
                fallback: Some(fallback),
            })
        }
    }
}

fn evaluate_grouped(
    dataset: &Dataset,
    rows: &[usize],
    facet: &GroupKey,
    grouping: &[String],
    predicates: &[Predicate],
) -> Result<GroupedAttempt> {
    let mut records = Vec::new();
    for (key, members) in dataset.partition(rows, grouping)? {
        let frame = dataset.frame(&members);
        let mut values = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            let shape = |produced: usize| {
                GroupedAttempt::ShapeMismatch(GroupingFallback {
                    facet: facet.clone(),
                    grouping: grouping.to_vec(),
                    predicate: predicate.source().to_string(),
                    group: key.clone(),
                    produced,
                })
            };
            let mut produced = match predicate.evaluate(&frame) {
                Ok(produced) => produced,
                // the predicate itself rejected the group's shape
                Err(EvalError::Shape(produced)) => return Ok(shape(produced)),
                Err(reason) => {
                    return Err(HighlightError::PredicateEvaluation {
                        predicate: predicate.source().to_string(),
                        location: Location::Group {
                            facet: facet.clone(),
                            group: key.clone(),
                        },
                        reason,
                    });
                }
            };
            if produced.len() != 1 {
                return Ok(shape(produced.len()));
            }
            values.append(&mut produced);
        }
        records.push(EvaluationRecord {
            subject: Subject::Group(key),
            rows: members,
            values,
        });
    }
    Ok(GroupedAttempt::Complete(records))
}

fn evaluate_rows(
    dataset: &Dataset,
    rows: &[usize],
    facet: &GroupKey,
    predicates: &[Predicate],
) -> Result<Vec<EvaluationRecord>> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let frame = dataset.frame(slice::from_ref(row));
        let mut values = Vec::with_capacity(predicates.len());
        for predicate in predicates {
            let location = || Location::Row {
                facet: facet.clone(),
                row: *row,
            };
            let mut produced = predicate.evaluate(&frame).map_err(|reason| {
                HighlightError::PredicateEvaluation {
                    predicate: predicate.source().to_string(),
                    location: location(),
                    reason,
                }
            })?;
            if produced.len() != 1 {
                return Err(HighlightError::PredicateEvaluation {
                    predicate: predicate.source().to_string(),
                    location: location(),
                    reason: EvalError::Shape(produced.len()),
                });
            }
            values.append(&mut produced);
        }
        records.push(EvaluationRecord {
            subject: Subject::Row(*row),
            rows: vec![*row],
            values,
        });
    }
    Ok(records)
}
