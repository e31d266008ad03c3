#![allow(dead_code)]

use highlight::construct::{Aesthetic, AestheticMapping, Column, Dataset, GroupKey, Schema};
use highlight::datatype::Value;

pub const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";

/// Deterministic stand-in for a random walk: 26 series (`type` = letters) of 10
/// points each, a boolean `flag` per point and a `panel` splitting the letters in two.
pub fn letters() -> Dataset {
    let schema = Schema::new(vec![
        Column::of::<f64>("idx"),
        Column::of::<f64>("value"),
        Column::of::<String>("type"),
        Column::of::<bool>("flag"),
        Column::discrete("panel"),
    ])
    .unwrap();
    let mut rows = Vec::new();
    for (t, letter) in LETTERS.chars().enumerate() {
        for i in 0..10 {
            let value = ((t * 7 + i * 3) % 23) as f64 + (t % 5) as f64 * 0.5;
            let flag = (t + i) % 3 == 0 || t % 4 == 0;
            let panel = if t % 2 == 0 { "even" } else { "odd" };
            rows.push(vec![
                Value::from(i as f64),
                Value::from(value),
                Value::from(letter.to_string()),
                Value::from(flag),
                Value::from(panel),
            ]);
        }
    }
    Dataset::new(schema, rows).unwrap()
}

pub fn line_mapping() -> AestheticMapping {
    AestheticMapping::new()
        .with(Aesthetic::X, "idx")
        .with(Aesthetic::Y, "value")
        .with(Aesthetic::Colour, "type")
}

pub fn key(letter: &str) -> GroupKey {
    GroupKey::from_iter([letter])
}

/// Per-letter maximum of `value`, in letter order.
pub fn max_by_letter(data: &Dataset) -> Vec<(String, f64)> {
    LETTERS
        .chars()
        .map(|c| {
            let letter = c.to_string();
            let max = (0..data.len())
                .filter(|&r| data.value(r, "type") == Some(&Value::from(letter.as_str())))
                .filter_map(|r| data.value(r, "value").and_then(Value::as_f64))
                .fold(f64::MIN, f64::max);
            (letter, max)
        })
        .collect()
}

/// Per-letter share of rows with `flag` set, in letter order.
pub fn flag_share_by_letter(data: &Dataset) -> Vec<(String, f64)> {
    LETTERS
        .chars()
        .map(|c| {
            let letter = c.to_string();
            let flags: Vec<f64> = (0..data.len())
                .filter(|&r| data.value(r, "type") == Some(&Value::from(letter.as_str())))
                .filter_map(|r| data.value(r, "flag").and_then(Value::as_f64))
                .collect();
            (letter, flags.iter().sum::<f64>() / flags.len() as f64)
        })
        .collect()
}

/// Rows rendered as strings, sorted, for order-independent comparison.
pub fn sorted_rows(data: &Dataset) -> Vec<String> {
    let mut rows: Vec<String> = data
        .rows()
        .iter()
        .map(|r| r.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>().join("|"))
        .collect();
    rows.sort();
    rows
}
