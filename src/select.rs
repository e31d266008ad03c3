//! Turns evaluation records into include/exclude decisions.
//!
//! Logical predicates are combined with AND; when `max_highlight` is set only
//! the first satisfying subjects (in dataset order) are kept. Orderable
//! predicates rank every subject in descending order and keep the top
//! `max_highlight` (5 when unset). Ties always fall back to dataset order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::construct::GroupKey;
use crate::datatype::Value;
use crate::evaluate::{Evaluation, Subject};
use crate::predicate::PredicateKind;

/// Number of subjects kept for orderable predicates when no limit is given.
pub const DEFAULT_MAX_HIGHLIGHT: usize = 5;

/// How several orderable predicates combine into one ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// First predicate is the primary key, later ones break ties, all descending.
    #[default]
    Lexicographic,
    /// Only the first predicate ranks; ties go straight to dataset order.
    PrimaryOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightDecision {
    pub facet: GroupKey,
    pub subject: Subject,
    pub included: bool,
    /// Ranking values, one per predicate (orderable predicates only).
    pub ranking: Option<Vec<Value>>,
    /// 1-based position in the ranking (orderable predicates only).
    pub rank: Option<usize>,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// One decision per subject, in subject order.
    pub decisions: Vec<HighlightDecision>,
    /// Indices into `decisions` of included subjects, in selection order.
    pub included: Vec<usize>,
}

pub fn select(
    evaluation: &Evaluation,
    facet: &GroupKey,
    max_highlight: Option<usize>,
    policy: RankingPolicy,
) -> Selection {
    match evaluation.kind {
        PredicateKind::Logical => select_logical(evaluation, facet, max_highlight),
        PredicateKind::Orderable => select_ranked(
            evaluation,
            facet,
            max_highlight.unwrap_or(DEFAULT_MAX_HIGHLIGHT),
            policy,
        ),
    }
}

fn select_logical(
    evaluation: &Evaluation,
    facet: &GroupKey,
    max_highlight: Option<usize>,
) -> Selection {
    let limit = max_highlight.unwrap_or(usize::MAX);
    let mut selection = Selection::default();
    for (i, record) in evaluation.records.iter().enumerate() {
        // missing counts as not satisfied
        let satisfied = record.values.iter().all(|v| v.as_bool() == Some(true));
        let included = satisfied && selection.included.len() < limit;
        if included {
            selection.included.push(i);
        }
        selection.decisions.push(HighlightDecision {
            facet: facet.clone(),
            subject: record.subject.clone(),
            included,
            ranking: None,
            rank: None,
            rows: record.rows.clone(),
        });
    }
    selection
}

/// Descending comparison of two ranking vectors under a policy. Equal results
/// are resolved by the caller through dataset order.
pub fn compare_rankings(a: &[Value], b: &[Value], policy: RankingPolicy) -> Ordering {
    let keys = match policy {
        RankingPolicy::Lexicographic => a.len().min(b.len()),
        RankingPolicy::PrimaryOnly => 1.min(a.len().min(b.len())),
    };
    (0..keys)
        .map(|k| b[k].rank_cmp(&a[k]))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

fn select_ranked(
    evaluation: &Evaluation,
    facet: &GroupKey,
    limit: usize,
    policy: RankingPolicy,
) -> Selection {
    let records = &evaluation.records;
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        compare_rankings(&records[a].values, &records[b].values, policy).then(a.cmp(&b))
    });
    let mut ranks = vec![0; records.len()];
    for (position, &i) in order.iter().enumerate() {
        ranks[i] = position + 1;
    }
    let decisions = records
        .iter()
        .zip(&ranks)
        .map(|(record, &rank)| HighlightDecision {
            facet: facet.clone(),
            subject: record.subject.clone(),
            included: rank <= limit,
            ranking: Some(record.values.clone()),
            rank: Some(rank),
            rows: record.rows.clone(),
        })
        .collect();
    order.truncate(limit);
    Selection {
        decisions,
        included: order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::EvaluationRecord;

    fn evaluation(kind: PredicateKind, values: Vec<Vec<Value>>) -> Evaluation {
        Evaluation {
            kind,
            grouping: vec!["type".to_string()],
            records: values
                .into_iter()
                .enumerate()
                .map(|(i, values)| EvaluationRecord {
                    subject: Subject::Group(GroupKey::from_iter([format!("g{i}")])),
                    rows: vec![i],
                    values,
                })
                .collect(),
            fallback: None,
        }
    }

    #[test]
    fn logical_limit_keeps_earliest() {
        let eval = evaluation(
            PredicateKind::Logical,
            vec![vec![true.into()], vec![false.into()], vec![true.into()], vec![true.into()]],
        );
        let selection = select(&eval, &GroupKey::empty(), Some(2), RankingPolicy::default());
        assert_eq!(selection.included, vec![0, 2]);
        assert!(!selection.decisions[3].included);
    }

    #[test]
    fn logical_missing_is_not_satisfied() {
        let eval = evaluation(PredicateKind::Logical, vec![vec![true.into(), Value::Missing]]);
        let selection = select(&eval, &GroupKey::empty(), None, RankingPolicy::default());
        assert!(selection.included.is_empty());
    }

    #[test]
    fn ranking_ties_break_on_second_key_then_order() {
        let eval = evaluation(
            PredicateKind::Orderable,
            vec![
                vec![3.0.into(), 1.0.into()],
                vec![3.0.into(), 2.0.into()],
                vec![5.0.into(), 0.0.into()],
                vec![3.0.into(), 2.0.into()],
            ],
        );
        let selection = select(&eval, &GroupKey::empty(), Some(3), RankingPolicy::Lexicographic);
        assert_eq!(selection.included, vec![2, 1, 3]);
        let primary = select(&eval, &GroupKey::empty(), Some(3), RankingPolicy::PrimaryOnly);
        assert_eq!(primary.included, vec![2, 0, 1]);
    }

    #[test]
    fn orderable_defaults_to_five() {
        let eval = evaluation(
            PredicateKind::Orderable,
            (0..8_i32).map(|i| vec![Value::from(i)]).collect(),
        );
        let selection = select(&eval, &GroupKey::empty(), None, RankingPolicy::default());
        assert_eq!(selection.included, vec![7, 6, 5, 4, 3]);
        assert_eq!(selection.decisions[7].rank, Some(1));
    }
}
