//! Decides which discrete columns partition the data into groups.
//!
//! An explicit `group` role wins outright. Otherwise every column mapped to any
//! role is used if it is discrete, in mapping order, without duplicates. When
//! nothing qualifies the result is empty and evaluation happens row by row.

use tracing::debug;

use crate::construct::{Aesthetic, AestheticMapping, Schema};
use crate::datatype::ColumnKind;

pub fn resolve(mapping: &AestheticMapping, schema: &Schema) -> Vec<String> {
    if let Some(group) = mapping.get(&Aesthetic::Group) {
        if schema.contains(group) {
            debug!(column = group, "grouping by explicit group role");
            return vec![group.to_string()];
        }
        // a group role pointing outside the data cannot partition it
        debug!(column = group, "group role does not name a column, ignoring it");
    }
    let mut columns: Vec<String> = Vec::new();
    for (aesthetic, column) in mapping.iter() {
        if *aesthetic == Aesthetic::Group {
            continue;
        }
        if schema.kind_of(column) == Some(ColumnKind::Discrete)
            && !columns.iter().any(|c| c == column)
        {
            columns.push(column.to_string());
        }
    }
    debug!(columns = ?columns, "grouping by discrete roles");
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::continuous("idx"),
            Column::continuous("value"),
            Column::discrete("type"),
            Column::discrete("flag"),
            Column::discrete("series"),
        ])
        .unwrap()
    }

    #[test]
    fn explicit_group_wins() {
        let mapping = AestheticMapping::new()
            .with(Aesthetic::X, "idx")
            .with(Aesthetic::Colour, "type")
            .with(Aesthetic::Group, "series");
        assert_eq!(resolve(&mapping, &schema()), vec!["series"]);
    }

    #[test]
    fn discrete_roles_in_mapping_order() {
        let mapping = AestheticMapping::new()
            .with(Aesthetic::X, "idx")
            .with(Aesthetic::Y, "value")
            .with(Aesthetic::Shape, "flag")
            .with(Aesthetic::Colour, "type")
            .with(Aesthetic::Fill, "flag");
        assert_eq!(resolve(&mapping, &schema()), vec!["flag", "type"]);
    }

    #[test]
    fn continuous_only_means_ungrouped() {
        let mapping = AestheticMapping::new()
            .with(Aesthetic::X, "idx")
            .with(Aesthetic::Y, "value");
        assert!(resolve(&mapping, &schema()).is_empty());
    }

    #[test]
    fn dangling_group_role_degrades_gracefully() {
        let mapping = AestheticMapping::new()
            .with(Aesthetic::Group, "missing")
            .with(Aesthetic::Colour, "type");
        assert_eq!(resolve(&mapping, &schema()), vec!["type"]);
    }
}
