use std::path::Path;

// config lets you read a separate options file, then layer environment variables on top
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::assemble::LabelAnchor;
use crate::construct::Schema;
use crate::error::{HighlightError, Result};
use crate::select::RankingPolicy;

/// Prefix of environment variables overriding file options, e.g. `HIGHLIGHT_MAX_HIGHLIGHT=3`.
pub const ENV_PREFIX: &str = "HIGHLIGHT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Cap on included subjects. Unset: unlimited for logical predicates, 5 for orderable ones.
    pub max_highlight: Option<usize>,
    /// Select independently within each facet.
    pub calculate_per_facet: bool,
    /// Passed through to the renderer.
    pub keep_scales: bool,
    /// `None` tries grouped evaluation and falls back, `Some(true)` forces it,
    /// `Some(false)` disables it.
    pub use_group_by: Option<bool>,
    pub ranking: RankingPolicy,
    pub label_anchor: LabelAnchor,
    /// Column holding the label text; defaults to the first grouping column.
    pub label_key: Option<String>,
    /// Evaluate facets on separate threads.
    pub parallel_facets: bool,
    pub unhighlighted_params: Map<String, JsonValue>,
    pub label_params: Map<String, JsonValue>,
}

impl Options {
    /// Reads options from a file (format from its extension) with environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        let options: Options = settings.try_deserialize()?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_highlight == Some(0) {
            return Err(HighlightError::Configuration(
                "max_highlight must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks the column names the options refer to.
    pub fn validate_against(&self, schema: &Schema) -> Result<()> {
        if let Some(key) = &self.label_key {
            if !schema.contains(key) {
                return Err(HighlightError::Configuration(format!(
                    "label_key '{}' is not in the dataset",
                    key
                )));
            }
        }
        if let LabelAnchor::MaxOf(column) = &self.label_anchor {
            if !schema.contains(column) {
                return Err(HighlightError::Configuration(format!(
                    "label anchor column '{}' is not in the dataset",
                    column
                )));
            }
        }
        Ok(())
    }

    pub fn max_highlight(mut self, max_highlight: usize) -> Self {
        self.max_highlight = Some(max_highlight);
        self
    }
    pub fn per_facet(mut self, calculate_per_facet: bool) -> Self {
        self.calculate_per_facet = calculate_per_facet;
        self
    }
    pub fn keep_scales(mut self, keep_scales: bool) -> Self {
        self.keep_scales = keep_scales;
        self
    }
    pub fn use_group_by(mut self, use_group_by: Option<bool>) -> Self {
        self.use_group_by = use_group_by;
        self
    }
    pub fn ranking(mut self, ranking: RankingPolicy) -> Self {
        self.ranking = ranking;
        self
    }
    pub fn label_anchor(mut self, label_anchor: LabelAnchor) -> Self {
        self.label_anchor = label_anchor;
        self
    }
    pub fn label_key(mut self, label_key: impl Into<String>) -> Self {
        self.label_key = Some(label_key.into());
        self
    }
    pub fn parallel_facets(mut self, parallel_facets: bool) -> Self {
        self.parallel_facets = parallel_facets;
        self
    }
}
