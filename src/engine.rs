//! The entry point wiring the pipeline together:
//! facet partitioning, grouping resolution, predicate evaluation, selection
//! and assembly. Every call is a pure function of its inputs.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::assemble::{self, LabelAnchor};
use crate::construct::{AestheticMapping, Dataset, GroupKey};
use crate::error::{GroupingFallback, HighlightError, Result};
use crate::evaluate::{self, GroupingMode, Subject};
use crate::facet::{self, Partition};
use crate::grouping;
use crate::options::Options;
use crate::predicate::{Predicate, PredicateKind};
use crate::select::{self, HighlightDecision, Selection};

/// An included subject, scoped by its facet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IncludedKey {
    pub facet: GroupKey,
    pub subject: Subject,
}

/// Style hints the selection never reads, handed on to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderHints {
    pub keep_scales: bool,
    pub label_anchor: LabelAnchor,
    pub unhighlighted_params: Map<String, JsonValue>,
    pub label_params: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightResult {
    pub kind: PredicateKind,
    /// Grouping columns resolved from the mapping, before any fallback.
    pub grouping: Vec<String>,
    /// Facet columns that scoped selection; empty unless per-facet calculation was on.
    pub facets: Vec<String>,
    /// All decisions, by facet then subject order.
    pub decisions: Vec<HighlightDecision>,
    /// Included subjects, by facet then selection order.
    pub included: Vec<IncludedKey>,
    pub highlighted: Dataset,
    pub unhighlighted: Dataset,
    /// One row per included subject, aligned with `included`.
    pub labels: Dataset,
    /// Dataset row index of each label row.
    pub label_anchors: Vec<usize>,
    pub label_key: Option<String>,
    pub fallbacks: Vec<GroupingFallback>,
    pub render: RenderHints,
}

impl HighlightResult {
    /// Group keys of included groups (row-wise subjects have none).
    pub fn group_keys(&self) -> Vec<&GroupKey> {
        self.included
            .iter()
            .filter_map(|k| match &k.subject {
                Subject::Group(key) => Some(key),
                Subject::Row(_) => None,
            })
            .collect()
    }
    pub fn is_included(&self, facet: &GroupKey, subject: &Subject) -> bool {
        self.included
            .iter()
            .any(|k| &k.facet == facet && &k.subject == subject)
    }
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| HighlightError::Export(e.to_string()))
    }
}

struct FacetOutcome {
    selection: Selection,
    grouped: bool,
    fallback: Option<GroupingFallback>,
}

/// Runs highlight selection over a borrowed, never mutated, dataset.
pub struct Highlighter<'d> {
    dataset: &'d Dataset,
    mapping: AestheticMapping,
    facets: Vec<String>,
}

impl<'d> Highlighter<'d> {
    pub fn new(dataset: &'d Dataset) -> Self {
        Self {
            dataset,
            mapping: AestheticMapping::new(),
            facets: Vec::new(),
        }
    }
    pub fn mapping(mut self, mapping: AestheticMapping) -> Self {
        self.mapping = mapping;
        self
    }
    /// Facet columns of the plot. They scope selection only when
    /// [`Options::calculate_per_facet`] is set.
    pub fn facet_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn execute(&self, predicates: &[Predicate], options: &Options) -> Result<HighlightResult> {
        // configuration problems surface before any row is evaluated
        options.validate()?;
        let kind = PredicateKind::common(predicates)?;
        let schema = self.dataset.schema();
        for predicate in predicates {
            predicate.bind(schema)?;
        }
        options.validate_against(schema)?;

        let grouping = grouping::resolve(&self.mapping, schema);
        let partitions = facet::partition(self.dataset, &self.facets, options.calculate_per_facet)?;
        let mode = GroupingMode::from(options.use_group_by);
        debug!(kind = %kind, grouping = ?grouping, partitions = partitions.len(), "highlighting");

        let outcomes = facet::run(&partitions, options.parallel_facets, |partition: &Partition| {
            let evaluation = evaluate::evaluate(
                self.dataset,
                &partition.rows,
                &partition.key,
                &grouping,
                predicates,
                mode,
            )?;
            let selection = select::select(
                &evaluation,
                &partition.key,
                options.max_highlight,
                options.ranking,
            );
            Ok(FacetOutcome {
                selection,
                grouped: !evaluation.grouping.is_empty(),
                fallback: evaluation.fallback,
            })
        })?;

        let mut decisions = Vec::new();
        let mut included_positions = Vec::new();
        let mut fallbacks = Vec::new();
        let mut grouped = true;
        for outcome in outcomes {
            grouped &= outcome.grouped;
            let offset = decisions.len();
            included_positions.extend(outcome.selection.included.iter().map(|i| i + offset));
            decisions.extend(outcome.selection.decisions);
            fallbacks.extend(outcome.fallback);
        }
        let included_decisions: Vec<&HighlightDecision> =
            included_positions.iter().map(|&i| &decisions[i]).collect();
        let assembly =
            assemble::assemble(self.dataset, &included_decisions, &options.label_anchor)?;
        let included: Vec<IncludedKey> = included_decisions
            .iter()
            .map(|d| IncludedKey {
                facet: d.facet.clone(),
                subject: d.subject.clone(),
            })
            .collect();

        info!(
            included = included.len(),
            highlighted = assembly.highlighted.len(),
            unhighlighted = assembly.unhighlighted.len(),
            fallbacks = fallbacks.len(),
            "highlight complete"
        );
        let facets = if options.calculate_per_facet {
            self.facets.clone()
        } else {
            Vec::new()
        };
        Ok(HighlightResult {
            kind,
            // rows evaluated on their own have no group to name
            label_key: options
                .label_key
                .clone()
                .or_else(|| grouping.first().filter(|_| grouped).cloned()),
            grouping,
            facets,
            decisions,
            included,
            highlighted: assembly.highlighted,
            unhighlighted: assembly.unhighlighted,
            labels: assembly.labels,
            label_anchors: assembly.label_anchors,
            fallbacks,
            render: RenderHints {
                keep_scales: options.keep_scales,
                label_anchor: options.label_anchor.clone(),
                unhighlighted_params: options.unhighlighted_params.clone(),
                label_params: options.label_params.clone(),
            },
        })
    }
}
