// used to collect the rows of included subjects
use roaring::RoaringTreemap;
use serde::{Deserialize, Serialize};

use crate::construct::Dataset;
use crate::error::{HighlightError, Result};
use crate::evaluate::Subject;
use crate::select::HighlightDecision;

/// Which row of an included group anchors its label. Row-wise subjects are
/// always anchored on the row itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAnchor {
    /// Last row of the group in dataset order, the end of a sequential series.
    #[default]
    Last,
    First,
    /// Row holding the largest value of the column; the earliest such row on ties.
    MaxOf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub highlighted: Dataset,
    pub unhighlighted: Dataset,
    /// One anchor row per included subject, in selection order.
    pub labels: Dataset,
    pub label_anchors: Vec<usize>,
}

/// Projects decisions back onto the dataset. `included` lists the included
/// decisions in selection order. Every row ends up in exactly one of the
/// highlighted or unhighlighted subsets, unchanged and in dataset order.
pub fn assemble(
    dataset: &Dataset,
    included: &[&HighlightDecision],
    anchor: &LabelAnchor,
) -> Result<Assembly> {
    let mut highlighted_rows = RoaringTreemap::new();
    let mut label_anchors = Vec::with_capacity(included.len());
    for decision in included {
        for &row in &decision.rows {
            highlighted_rows.insert(row as u64);
        }
        label_anchors.push(anchor_row(dataset, decision, anchor)?);
    }
    let unhighlighted = (0..dataset.len()).filter(|&r| !highlighted_rows.contains(r as u64));
    Ok(Assembly {
        highlighted: dataset.subset(highlighted_rows.iter().map(|r| r as usize)),
        unhighlighted: dataset.subset(unhighlighted),
        labels: dataset.subset(label_anchors.iter().copied()),
        label_anchors,
    })
}

fn anchor_row(
    dataset: &Dataset,
    decision: &HighlightDecision,
    anchor: &LabelAnchor,
) -> Result<usize> {
    if let Subject::Row(row) = decision.subject {
        return Ok(row);
    }
    let empty = || HighlightError::Invariant(format!("group {:?} has no rows", decision.subject));
    match anchor {
        LabelAnchor::Last => decision.rows.last().copied().ok_or_else(empty),
        LabelAnchor::First => decision.rows.first().copied().ok_or_else(empty),
        LabelAnchor::MaxOf(column) => {
            let position = dataset.schema().position(column).ok_or_else(|| {
                HighlightError::Configuration(format!(
                    "label anchor column '{}' is not in the dataset",
                    column
                ))
            })?;
            let mut best: Option<usize> = None;
            for &row in &decision.rows {
                let replace = match best {
                    None => true,
                    Some(b) => dataset.rows()[row][position]
                        .rank_cmp(&dataset.rows()[b][position])
                        .is_gt(),
                };
                if replace {
                    best = Some(row);
                }
            }
            best.ok_or_else(empty)
        }
    }
}
