//! Highlight – decides which groups or rows of a layered plot dataset to emphasize.
//!
//! A plot draws a dataset as several series (lines, points, bars). Given one or
//! more predicates, this crate picks the series worth emphasizing while keeping
//! every other row around as context. Nothing is ever dropped: each row lands in
//! either the highlighted or the unhighlighted subset.
//!
//! The pipeline, leaf first:
//! * [`grouping`] – infers the grouping columns from the aesthetic mapping: an
//!   explicit `group` role, else every discrete mapped column, else none (row-wise).
//! * [`evaluate`] – evaluates the predicates per group, falling back to row-wise
//!   evaluation when a predicate does not reduce a group to a single value.
//! * [`select`] – ANDs logical predicates, or ranks by orderable predicates and
//!   keeps the top `max_highlight`, with deterministic tie-breaks.
//! * [`facet`] – optionally runs all of the above independently per facet.
//! * [`assemble`] – projects decisions back onto rows: highlighted, unhighlighted,
//!   and one label anchor row per included group.
//!
//! [`engine::Highlighter`] wires these together.
//!
//! ## Data
//! A [`construct::Dataset`] is an ordered set of rows over a [`construct::Schema`]
//! of discrete or continuous columns holding [`datatype::Value`]s. Predicates are
//! [`predicate::Predicate`]s, built from closures or from the small
//! [`expr`] language, which renders its own source text.
//!
//! ## Quick Start
//! ```
//! use highlight::construct::{Aesthetic, AestheticMapping, Column, Dataset, Schema};
//! use highlight::engine::Highlighter;
//! use highlight::expr::col;
//! use highlight::options::Options;
//!
//! let schema = Schema::new(vec![
//!     Column::continuous("idx"),
//!     Column::continuous("value"),
//!     Column::discrete("type"),
//! ]).unwrap();
//! let data = Dataset::new(schema, vec![
//!     vec![1.0.into(), 10.0.into(), "a".into()],
//!     vec![2.0.into(), 25.0.into(), "a".into()],
//!     vec![1.0.into(), 5.0.into(), "b".into()],
//!     vec![2.0.into(), 8.0.into(), "b".into()],
//! ]).unwrap();
//! let mapping = AestheticMapping::new()
//!     .with(Aesthetic::X, "idx")
//!     .with(Aesthetic::Y, "value")
//!     .with(Aesthetic::Colour, "type");
//! let result = Highlighter::new(&data)
//!     .mapping(mapping)
//!     .execute(&[col("value").max().gt(20).into_predicate()], &Options::default())
//!     .unwrap();
//! assert_eq!(result.highlighted.len(), 2);
//! assert_eq!(result.unhighlighted.len(), 2);
//! assert_eq!(result.labels.value(0, "idx"), Some(&2.0.into()));
//! ```
//!
//! ## Options
//! [`options::Options`] can be built in code or loaded from a file through the
//! `config` crate, with `HIGHLIGHT_*` environment variables taking precedence.

pub mod assemble;
pub mod construct;
pub mod datatype;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod expr;
pub mod facet;
pub mod grouping;
pub mod options;
pub mod predicate;
pub mod select;

pub use error::{HighlightError, Result};

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber honouring `RUST_LOG`, or `default_filter`
/// when unset. Calling it again is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
