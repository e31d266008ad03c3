mod common;

use highlight::construct::{Aesthetic, AestheticMapping};
use highlight::engine::Highlighter;
use highlight::evaluate::Subject;
use highlight::expr::col;
use highlight::options::Options;
use highlight::predicate::PredicateKind;

use common::{flag_share_by_letter, key, letters, line_mapping, max_by_letter};

#[test]
fn max_value_above_twenty() {
    let data = letters();
    let result = Highlighter::new(&data)
        .mapping(line_mapping())
        .execute(&[col("value").max().gt(20).into_predicate()], &Options::default())
        .expect("highlight ok");
    let expected: Vec<String> = max_by_letter(&data)
        .into_iter()
        .filter(|(_, max)| *max > 20.0)
        .map(|(letter, _)| letter)
        .collect();
    let included: Vec<String> = result.group_keys().iter().map(|k| k.to_string()).collect();
    let expected_keys: Vec<String> = expected.iter().map(|l| key(l).to_string()).collect();
    assert_eq!(result.kind, PredicateKind::Logical);
    assert_eq!(result.grouping, vec!["type"]);
    assert_eq!(included, expected_keys, "exactly the groups whose max exceeds 20");
    assert_eq!(result.highlighted.len(), expected.len() * 10);
    // u and z peak at exactly 20 and stay in the background
    for row in result.unhighlighted.rows() {
        let letter = row[2].to_string();
        assert!(letter == "u" || letter == "z", "unexpected unhighlighted series {letter}");
    }
    assert!(result.fallbacks.is_empty());
}

#[test]
fn two_predicates_are_combined_with_and() {
    let data = letters();
    let predicates = vec![
        col("value").max().gt(15).into_predicate(),
        col("flag").mean().gt(0.55).into_predicate(),
    ];
    let result = Highlighter::new(&data)
        .mapping(line_mapping())
        .execute(&predicates, &Options::default())
        .expect("highlight ok");
    let maxes = max_by_letter(&data);
    let shares = flag_share_by_letter(&data);
    for ((letter, max), (_, share)) in maxes.iter().zip(&shares) {
        let both = *max > 15.0 && *share > 0.55;
        assert_eq!(
            result.is_included(&Default::default(), &Subject::Group(key(letter))),
            both,
            "group {letter}: max {max}, flag share {share}"
        );
    }
    assert_eq!(result.group_keys().len(), 7);
}

#[test]
fn max_highlight_keeps_first_groups_in_data_order() {
    let data = letters();
    let predicate = [col("value").max().gt(20).into_predicate()];
    let all = Highlighter::new(&data)
        .mapping(line_mapping())
        .execute(&predicate, &Options::default())
        .expect("highlight ok");
    let capped = Highlighter::new(&data)
        .mapping(line_mapping())
        .execute(&predicate, &Options::default().max_highlight(3))
        .expect("highlight ok");
    assert_eq!(capped.included.len(), 3);
    assert_eq!(capped.included[..], all.included[..3], "truncation is a prefix in original order");
    assert_eq!(capped.highlighted.len() + capped.unhighlighted.len(), data.len());
}

#[test]
fn row_wise_logical_without_discrete_mapping() {
    let data = letters();
    let mapping = AestheticMapping::new()
        .with(Aesthetic::X, "idx")
        .with(Aesthetic::Y, "value");
    let result = Highlighter::new(&data)
        .mapping(mapping)
        .execute(&[col("value").gt(22).into_predicate()], &Options::default())
        .expect("highlight ok");
    assert!(result.grouping.is_empty());
    assert!(result.label_key.is_none());
    let expected = data
        .rows()
        .iter()
        .filter(|r| r[1].as_f64().is_some_and(|v| v > 22.0))
        .count();
    assert_eq!(result.highlighted.len(), expected);
    assert_eq!(result.labels.len(), expected, "each highlighted row labels itself");
    for (subject, anchor) in result.included.iter().zip(&result.label_anchors) {
        assert_eq!(subject.subject, Subject::Row(*anchor));
    }
}
