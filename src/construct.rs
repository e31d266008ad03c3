// partition maps are keyed by group keys, hashed with a fast non-cryptographic hasher
use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

// used to print out readable forms of a construct
use std::fmt;

use serde::Serialize;

// our own stuff that we need
use crate::datatype::{ColumnKind, DataType, Value};
use crate::error::{EvalError, HighlightError, Result};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// ------------- Column -------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
    pub fn discrete(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Discrete)
    }
    pub fn continuous(name: impl Into<String>) -> Self {
        Self::new(name, ColumnKind::Continuous)
    }
    /// Column whose kind follows from the Rust type stored in it.
    pub fn of<T: DataType>(name: impl Into<String>) -> Self {
        Self::new(name, T::KIND)
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }
}

// ------------- Schema -------------
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
    #[serde(skip)]
    positions: HashMap<String, usize, OtherHasher>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut positions = HashMap::<String, usize, OtherHasher>::default();
        for (i, column) in columns.iter().enumerate() {
            if positions.insert(column.name.clone(), i).is_some() {
                return Err(HighlightError::Schema(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns, positions })
    }
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|i| &self.columns[i])
    }
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(Column::kind)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

// ------------- GroupKey -------------
/// Values of the grouping (or facet) columns identifying one group.
/// The empty key means "no grouping".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupKey(Vec<Value>);

impl GroupKey {
    pub fn empty() -> Self {
        Self(Vec::new())
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

impl<V: Into<Value>> FromIterator<V> for GroupKey {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

// ------------- Dataset -------------
/// Ordered rows sharing one schema. Never mutated once built; subsets are new datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset, checking that every row matches the schema width and
    /// that every present value fits the kind of its column.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (r, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(HighlightError::Schema(format!(
                    "row {} has {} values, schema has {} columns",
                    r,
                    row.len(),
                    schema.len()
                )));
            }
            for (value, column) in row.iter().zip(schema.columns()) {
                if let Some(kind) = value.kind() {
                    if kind != column.kind() {
                        return Err(HighlightError::Schema(format!(
                            "row {}: {} value '{}' in {} column '{}'",
                            r,
                            value.data_type(),
                            value,
                            column.kind(),
                            column.name()
                        )));
                    }
                }
            }
        }
        Ok(Self { schema, rows })
    }
    /// Copies the given rows, in the given order, into a new dataset with the same schema.
    pub(crate) fn subset<I: IntoIterator<Item = usize>>(&self, indices: I) -> Self {
        Self {
            schema: self.schema.clone(),
            rows: indices.into_iter().map(|i| self.rows[i].clone()).collect(),
        }
    }
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
    pub fn row(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.schema.position(column)?;
        self.rows.get(row).map(|r| &r[position])
    }
    pub(crate) fn frame<'a>(&'a self, rows: &'a [usize]) -> Frame<'a> {
        Frame { dataset: self, rows }
    }
    pub fn all_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }

    /// Splits the given rows by the values of `columns`. Partitions come back in
    /// order of first appearance, rows inside each partition keep their order.
    pub(crate) fn partition(
        &self,
        rows: &[usize],
        columns: &[String],
    ) -> Result<Vec<(GroupKey, Vec<usize>)>> {
        let positions = columns
            .iter()
            .map(|c| {
                self.schema
                    .position(c)
                    .ok_or_else(|| HighlightError::Schema(format!("unknown column '{}'", c)))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut slots = HashMap::<GroupKey, usize, OtherHasher>::default();
        let mut partitions: Vec<(GroupKey, Vec<usize>)> = Vec::new();
        for &r in rows {
            let key = GroupKey(positions.iter().map(|&p| self.rows[r][p].clone()).collect());
            match slots.entry(key) {
                Entry::Occupied(slot) => partitions[*slot.get()].1.push(r),
                Entry::Vacant(slot) => {
                    partitions.push((slot.key().clone(), vec![r]));
                    slot.insert(partitions.len() - 1);
                }
            }
        }
        Ok(partitions)
    }
}

// ------------- Frame -------------
/// Borrowed view over a subset of rows, handed to predicates.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    dataset: &'a Dataset,
    rows: &'a [usize],
}

impl<'a> Frame<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// Indices of the viewed rows in the underlying dataset.
    pub fn rows(&self) -> &'a [usize] {
        self.rows
    }
    pub fn schema(&self) -> &'a Schema {
        &self.dataset.schema
    }
    pub fn column(&self, name: &str) -> std::result::Result<Vec<&'a Value>, EvalError> {
        let dataset: &'a Dataset = self.dataset;
        let position = dataset
            .schema
            .position(name)
            .ok_or_else(|| EvalError::UnknownColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|&r| &dataset.rows[r][position]).collect())
    }
}

// ------------- Aesthetics -------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aesthetic {
    X,
    Y,
    Colour,
    Fill,
    Group,
    Shape,
    Linetype,
    Size,
    Alpha,
    Label,
    Other(String),
}

/// Role to column mapping, in the order the roles were declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AestheticMapping {
    entries: Vec<(Aesthetic, String)>,
}

impl AestheticMapping {
    pub fn new() -> Self {
        Self::default()
    }
    /// Maps a role to a column; remapping an existing role keeps its position.
    pub fn with(mut self, aesthetic: Aesthetic, column: impl Into<String>) -> Self {
        let column = column.into();
        match self.entries.iter_mut().find(|(a, _)| *a == aesthetic) {
            Some(entry) => entry.1 = column,
            None => self.entries.push((aesthetic, column)),
        }
        self
    }
    pub fn get(&self, aesthetic: &Aesthetic) -> Option<&str> {
        self.entries
            .iter()
            .find(|(a, _)| a == aesthetic)
            .map(|(_, c)| c.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = (&Aesthetic, &str)> {
        self.entries.iter().map(|(a, c)| (a, c.as_str()))
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Into<String>> FromIterator<(Aesthetic, C)> for AestheticMapping {
    fn from_iter<I: IntoIterator<Item = (Aesthetic, C)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |mapping, (aesthetic, column)| mapping.with(aesthetic, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let schema =
            Schema::new(vec![Column::discrete("type"), Column::continuous("value")]).unwrap();
        Dataset::new(
            schema,
            vec![
                vec!["b".into(), 1.0.into()],
                vec!["a".into(), 2.0.into()],
                vec!["b".into(), 3.0.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn partitions_follow_first_appearance() {
        let data = dataset();
        let parts = data.partition(&data.all_rows(), &["type".to_string()]).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, GroupKey::from_iter(["b"]));
        assert_eq!(parts[0].1, vec![0, 2]);
        assert_eq!(parts[1].1, vec![1]);
    }

    #[test]
    fn rejects_value_of_wrong_kind() {
        let schema = Schema::new(vec![Column::continuous("value")]).unwrap();
        let err = Dataset::new(schema, vec![vec!["oops".into()]]).unwrap_err();
        assert!(matches!(err, HighlightError::Schema(_)));
    }

    #[test]
    fn typed_columns_take_kind_from_rust_type() {
        assert_eq!(Column::of::<f64>("value").kind(), ColumnKind::Continuous);
        assert_eq!(Column::of::<NaiveDate>("day").kind(), ColumnKind::Continuous);
        assert_eq!(Column::of::<bool>("flag").kind(), ColumnKind::Discrete);
        assert_eq!(Column::of::<String>("type"), Column::discrete("type"));
    }

    #[test]
    fn remapping_keeps_position() {
        let mapping = AestheticMapping::new()
            .with(Aesthetic::X, "a")
            .with(Aesthetic::Colour, "b")
            .with(Aesthetic::X, "c");
        let roles: Vec<_> = mapping.iter().map(|(a, c)| (a.clone(), c.to_string())).collect();
        assert_eq!(
            roles,
            vec![(Aesthetic::X, "c".to_string()), (Aesthetic::Colour, "b".to_string())]
        );
    }
}
