mod common;

use highlight::construct::{Dataset, GroupKey};
use highlight::engine::{HighlightResult, Highlighter};
use highlight::error::HighlightError;
use highlight::expr::col;
use highlight::options::Options;

use common::{letters, line_mapping};

fn run(data: &Dataset, options: &Options) -> HighlightResult {
    Highlighter::new(data)
        .mapping(line_mapping())
        .facet_by(["panel"])
        .execute(&[col("value").max().into_predicate()], options)
        .expect("highlight ok")
}

fn panel(name: &str) -> GroupKey {
    GroupKey::from_iter([name])
}

#[test]
fn limit_applies_within_each_facet() {
    let data = letters();
    let result = run(&data, &Options::default().max_highlight(2).per_facet(true));
    assert_eq!(result.facets, vec!["panel"]);
    let per_panel: Vec<(String, String)> = result
        .included
        .iter()
        .map(|k| (k.facet.to_string(), format!("{:?}", k.subject)))
        .collect();
    assert_eq!(per_panel.len(), 4, "two per panel");
    // even letters come first in the data (a), so the even panel leads
    assert_eq!(result.included[0].facet, panel("even"));
    assert_eq!(result.included[2].facet, panel("odd"));
}

#[test]
fn facets_are_ignored_unless_requested() {
    let data = letters();
    let result = run(&data, &Options::default().max_highlight(2));
    assert!(result.facets.is_empty());
    assert_eq!(result.included.len(), 2);
    assert!(result.included.iter().all(|k| k.facet.is_empty()));
}

#[test]
fn facet_result_does_not_depend_on_other_facets() {
    let data = letters();
    let options = Options::default().max_highlight(3).per_facet(true);
    let full = run(&data, &options);
    let odd_rows: Vec<Vec<_>> = data
        .rows()
        .iter()
        .filter(|r| r[4].to_string() == "odd")
        .cloned()
        .collect();
    let odd_only = Dataset::new(data.schema().clone(), odd_rows).unwrap();
    let alone = run(&odd_only, &options);
    let odd = panel("odd");
    let from_full: Vec<_> = full.included.iter().filter(|k| k.facet == odd).collect();
    let from_alone: Vec<_> = alone.included.iter().collect();
    assert_eq!(from_full, from_alone);
}

#[test]
fn parallel_matches_sequential() {
    let data = letters();
    let sequential = run(&data, &Options::default().per_facet(true));
    let parallel = run(&data, &Options::default().per_facet(true).parallel_facets(true));
    assert_eq!(sequential.decisions, parallel.decisions);
    assert_eq!(sequential.included, parallel.included);
    assert_eq!(sequential.highlighted, parallel.highlighted);
}

#[test]
fn unknown_facet_column_fails_fast() {
    let data = letters();
    let err = Highlighter::new(&data)
        .mapping(line_mapping())
        .facet_by(["nope"])
        .execute(&[col("value").max().into_predicate()], &Options::default().per_facet(true))
        .unwrap_err();
    assert!(matches!(err, HighlightError::Configuration(_)));
}
