//! A small vectorised expression language for writing predicates.
//!
//! Expressions are evaluated against a [`Frame`] and produce one value per row
//! or, for aggregates, a single value. Binary operators broadcast a single value
//! against a column, so `col("value").max().gt(20)` yields exactly one boolean
//! per group while `col("value").gt(20)` yields one per row.
//!
//! ```
//! use highlight::expr::{col, lit};
//! let e = col("value").max().gt(20).and(col("type").ne(lit("z")));
//! assert_eq!(e.to_string(), "max(value) > 20 & type != \"z\"");
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::construct::{Frame, OtherHasher};
use crate::datatype::Value;
use crate::error::EvalError;
use crate::predicate::{Predicate, PredicateKind};

type EvalResult = std::result::Result<Vec<Value>, EvalError>;

/// Comparison operator used by binary expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Equals (`==`).
    Equal,
    /// Not equals (`!=`).
    NotEqual,
    /// Less than (`<`).
    LessThan,
    /// Less than or equal to (`<=`).
    LessThanOrEqual,
    /// Greater than (`>`).
    GreaterThan,
    /// Greater than or equal to (`>=`).
    GreaterThanOrEqual,
}

impl ComparisonOp {
    /// Returns whether an ordering between left and right satisfies the operator.
    #[must_use]
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOp::Equal => ordering == Ordering::Equal,
            ComparisonOp::NotEqual => ordering != Ordering::Equal,
            ComparisonOp::LessThan => ordering == Ordering::Less,
            ComparisonOp::LessThanOrEqual => ordering != Ordering::Greater,
            ComparisonOp::GreaterThan => ordering == Ordering::Greater,
            ComparisonOp::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::LessThan => "<",
            ComparisonOp::LessThanOrEqual => "<=",
            ComparisonOp::GreaterThan => ">",
            ComparisonOp::GreaterThanOrEqual => ">=",
        })
    }
}

/// Reductions from many values to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Max,
    Min,
    Mean,
    Sum,
    /// Number of values, missing included.
    Count,
    First,
    Last,
    Any,
    All,
    NDistinct,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregate::Max => "max",
            Aggregate::Min => "min",
            Aggregate::Mean => "mean",
            Aggregate::Sum => "sum",
            Aggregate::Count => "count",
            Aggregate::First => "first",
            Aggregate::Last => "last",
            Aggregate::Any => "any",
            Aggregate::All => "all",
            Aggregate::NDistinct => "n_distinct",
        })
    }
}

/// Expression tree; leaf and branch variants coexist.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Aggregate {
        func: Aggregate,
        arg: Box<Expr>,
    },
    Compare {
        left: Box<Expr>,
        op: ComparisonOp,
        right: Box<Expr>,
    },
    /// Conjunction over multiple expressions.
    And(Vec<Expr>),
    /// Disjunction over multiple expressions.
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

/// References a column by name.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Wraps a literal value.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        lit(n)
    }
}
impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit(n)
    }
}
impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit(n)
    }
}
impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit(b)
    }
}
impl From<NaiveDate> for Expr {
    fn from(d: NaiveDate) -> Self {
        lit(d)
    }
}
impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl Expr {
    fn aggregate(self, func: Aggregate) -> Expr {
        Expr::Aggregate {
            func,
            arg: Box::new(self),
        }
    }
    #[must_use]
    pub fn max(self) -> Expr {
        self.aggregate(Aggregate::Max)
    }
    #[must_use]
    pub fn min(self) -> Expr {
        self.aggregate(Aggregate::Min)
    }
    #[must_use]
    pub fn mean(self) -> Expr {
        self.aggregate(Aggregate::Mean)
    }
    #[must_use]
    pub fn sum(self) -> Expr {
        self.aggregate(Aggregate::Sum)
    }
    #[must_use]
    pub fn count(self) -> Expr {
        self.aggregate(Aggregate::Count)
    }
    #[must_use]
    pub fn first(self) -> Expr {
        self.aggregate(Aggregate::First)
    }
    #[must_use]
    pub fn last(self) -> Expr {
        self.aggregate(Aggregate::Last)
    }
    #[must_use]
    pub fn any(self) -> Expr {
        self.aggregate(Aggregate::Any)
    }
    #[must_use]
    pub fn all(self) -> Expr {
        self.aggregate(Aggregate::All)
    }
    #[must_use]
    pub fn n_distinct(self) -> Expr {
        self.aggregate(Aggregate::NDistinct)
    }

    /// Builds a comparison against another expression or literal.
    #[must_use]
    pub fn compare<R: Into<Expr>>(self, op: ComparisonOp, right: R) -> Expr {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }
    #[must_use]
    pub fn eq<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::Equal, right)
    }
    #[must_use]
    pub fn ne<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::NotEqual, right)
    }
    #[must_use]
    pub fn lt<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::LessThan, right)
    }
    #[must_use]
    pub fn le<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::LessThanOrEqual, right)
    }
    #[must_use]
    pub fn gt<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::GreaterThan, right)
    }
    #[must_use]
    pub fn ge<R: Into<Expr>>(self, right: R) -> Expr {
        self.compare(ComparisonOp::GreaterThanOrEqual, right)
    }

    /// Conjunction; nested conjunctions are flattened.
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        let mut clauses = Vec::new();
        for clause in [self, other] {
            match clause {
                Expr::And(mut nested) => clauses.append(&mut nested),
                other => clauses.push(other),
            }
        }
        Expr::And(clauses)
    }

    /// Disjunction; nested disjunctions are flattened.
    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        let mut clauses = Vec::new();
        for clause in [self, other] {
            match clause {
                Expr::Or(mut nested) => clauses.append(&mut nested),
                other => clauses.push(other),
            }
        }
        Expr::Or(clauses)
    }

    #[must_use]
    pub fn not(self) -> Expr {
        match self {
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        }
    }

    /// True when the expression produces booleans, which makes it a logical predicate.
    pub fn is_logical(&self) -> bool {
        match self {
            Expr::Compare { .. } | Expr::And(_) | Expr::Or(_) | Expr::Not(_) => true,
            Expr::Aggregate { func, .. } => matches!(func, Aggregate::Any | Aggregate::All),
            Expr::Literal(v) => matches!(v, Value::Boolean(_)),
            Expr::Column(_) => false,
        }
    }

    /// Referenced columns in order of first mention.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }
    fn collect_columns(&self, acc: &mut Vec<String>) {
        match self {
            Expr::Column(name) => {
                if !acc.contains(name) {
                    acc.push(name.clone());
                }
            }
            Expr::Literal(_) => (),
            Expr::Aggregate { arg, .. } => arg.collect_columns(acc),
            Expr::Compare { left, right, .. } => {
                left.collect_columns(acc);
                right.collect_columns(acc);
            }
            Expr::And(clauses) | Expr::Or(clauses) => {
                clauses.iter().for_each(|c| c.collect_columns(acc))
            }
            Expr::Not(inner) => inner.collect_columns(acc),
        }
    }

    pub fn evaluate(&self, frame: &Frame<'_>) -> EvalResult {
        match self {
            Expr::Column(name) => Ok(frame.column(name)?.into_iter().cloned().collect()),
            Expr::Literal(value) => Ok(vec![value.clone()]),
            Expr::Aggregate { func, arg } => {
                let values = arg.evaluate(frame)?;
                Ok(vec![reduce(*func, &values)?])
            }
            Expr::Compare { left, op, right } => {
                let left = left.evaluate(frame)?;
                let right = right.evaluate(frame)?;
                broadcast(&left, &right, |l, r| compare(l, *op, r))
            }
            Expr::And(clauses) => fold_logical(clauses, frame, and3),
            Expr::Or(clauses) => fold_logical(clauses, frame, or3),
            Expr::Not(inner) => inner
                .evaluate(frame)?
                .iter()
                .map(|v| match v {
                    Value::Missing => Ok(Value::Missing),
                    Value::Boolean(b) => Ok(Value::Boolean(!b)),
                    other => Err(not_boolean("!", other)),
                })
                .collect(),
        }
    }

    /// Converts the expression into a predicate, using its rendered text as source.
    pub fn into_predicate(self) -> Predicate {
        Predicate::from(self)
    }

    fn needs_parens(&self) -> bool {
        matches!(self, Expr::Compare { .. } | Expr::And(_) | Expr::Or(_))
    }
}

impl From<Expr> for Predicate {
    fn from(expr: Expr) -> Self {
        let kind = if expr.is_logical() {
            PredicateKind::Logical
        } else {
            PredicateKind::Orderable
        };
        let source = expr.to_string();
        let columns = expr.columns();
        let expr = Arc::new(expr);
        Predicate::new(source, kind, columns, move |frame| expr.evaluate(frame))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(Value::Text(s)) => write!(f, "{:?}", s),
            Expr::Literal(Value::Date(d)) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Aggregate { func, arg } => write!(f, "{}({})", func, arg),
            Expr::Compare { left, op, right } => {
                write_operand(f, left)?;
                write!(f, " {} ", op)?;
                write_operand(f, right)
            }
            Expr::And(clauses) => write_joined(f, clauses, " & "),
            Expr::Or(clauses) => write_joined(f, clauses, " | "),
            Expr::Not(inner) => {
                write!(f, "!")?;
                write_operand(f, inner)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    if e.needs_parens() {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, clauses: &[Expr], sep: &str) -> fmt::Result {
    for (i, clause) in clauses.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        // a conjunction directly inside a disjunction (or vice versa) keeps its parens
        if matches!(clause, Expr::And(_) | Expr::Or(_)) {
            write!(f, "({})", clause)?;
        } else {
            write!(f, "{}", clause)?;
        }
    }
    Ok(())
}

fn not_boolean(op: &str, value: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "operand of `{}` must be boolean, got {} '{}'",
        op,
        value.data_type(),
        value
    ))
}

fn broadcast<F>(left: &[Value], right: &[Value], f: F) -> EvalResult
where
    F: Fn(&Value, &Value) -> std::result::Result<Value, EvalError>,
{
    match (left.len(), right.len()) {
        (l, r) if l == r => left.iter().zip(right).map(|(a, b)| f(a, b)).collect(),
        (1, _) => right.iter().map(|b| f(&left[0], b)).collect(),
        (_, 1) => left.iter().map(|a| f(a, &right[0])).collect(),
        (l, r) => Err(EvalError::Failed(format!(
            "cannot combine {} values with {} values",
            l, r
        ))),
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Missing => true,
        Value::Numeric(n) => n.is_nan(),
        _ => false,
    }
}

fn compare(left: &Value, op: ComparisonOp, right: &Value) -> std::result::Result<Value, EvalError> {
    if is_absent(left) || is_absent(right) {
        return Ok(Value::Missing);
    }
    left.compare(right)
        .map(|ordering| Value::Boolean(op.holds(ordering)))
        .ok_or_else(|| {
            EvalError::TypeMismatch(format!(
                "cannot compare {} with {}",
                left.data_type(),
                right.data_type()
            ))
        })
}

fn fold_logical<F>(clauses: &[Expr], frame: &Frame<'_>, combine: F) -> EvalResult
where
    F: Fn(&Value, &Value) -> std::result::Result<Value, EvalError> + Copy,
{
    let mut acc: Option<Vec<Value>> = None;
    for clause in clauses {
        let values = clause.evaluate(frame)?;
        acc = Some(match acc {
            None => values
                .into_iter()
                .map(|v| match v {
                    Value::Missing | Value::Boolean(_) => Ok(v),
                    other => Err(not_boolean("&", &other)),
                })
                .collect::<EvalResult>()?,
            Some(prev) => broadcast(&prev, &values, combine)?,
        });
    }
    acc.ok_or_else(|| EvalError::Failed("empty connective".to_string()))
}

// three-valued logic: a definite false (true) wins over missing in AND (OR)
fn and3(a: &Value, b: &Value) -> std::result::Result<Value, EvalError> {
    match (a, b) {
        (Value::Boolean(false), _) | (_, Value::Boolean(false)) => {
            check_both(a, b, Value::Boolean(false))
        }
        (Value::Boolean(true), Value::Boolean(true)) => Ok(Value::Boolean(true)),
        _ => check_both(a, b, Value::Missing),
    }
}

fn or3(a: &Value, b: &Value) -> std::result::Result<Value, EvalError> {
    match (a, b) {
        (Value::Boolean(true), _) | (_, Value::Boolean(true)) => {
            check_both(a, b, Value::Boolean(true))
        }
        (Value::Boolean(false), Value::Boolean(false)) => Ok(Value::Boolean(false)),
        _ => check_both(a, b, Value::Missing),
    }
}

fn check_both(a: &Value, b: &Value, result: Value) -> std::result::Result<Value, EvalError> {
    for v in [a, b] {
        if !matches!(v, Value::Missing | Value::Boolean(_)) {
            return Err(not_boolean("&", v));
        }
    }
    Ok(result)
}

fn reduce(func: Aggregate, values: &[Value]) -> std::result::Result<Value, EvalError> {
    match func {
        Aggregate::Count => Ok(Value::Numeric(values.len() as f64)),
        Aggregate::First => Ok(values.first().cloned().unwrap_or(Value::Missing)),
        Aggregate::Last => Ok(values.last().cloned().unwrap_or(Value::Missing)),
        Aggregate::NDistinct => {
            let distinct: HashSet<&Value, OtherHasher> = values.iter().collect();
            Ok(Value::Numeric(distinct.len() as f64))
        }
        Aggregate::Max | Aggregate::Min => extreme(func, values),
        Aggregate::Sum | Aggregate::Mean => {
            let mut total = 0.0;
            for v in values {
                if v.is_missing() {
                    return Ok(Value::Missing);
                }
                total += v.as_f64().ok_or_else(|| {
                    EvalError::TypeMismatch(format!("{}() over {} values", func, v.data_type()))
                })?;
            }
            if func == Aggregate::Sum {
                Ok(Value::Numeric(total))
            } else {
                Ok(Value::Numeric(total / values.len() as f64))
            }
        }
        Aggregate::Any | Aggregate::All => {
            let decisive = func == Aggregate::Any;
            let mut saw_missing = false;
            for v in values {
                match v {
                    Value::Boolean(b) if *b == decisive => return Ok(Value::Boolean(decisive)),
                    Value::Boolean(_) => (),
                    Value::Missing => saw_missing = true,
                    other => return Err(not_boolean(&func.to_string(), other)),
                }
            }
            Ok(if saw_missing { Value::Missing } else { Value::Boolean(!decisive) })
        }
    }
}

fn extreme(func: Aggregate, values: &[Value]) -> std::result::Result<Value, EvalError> {
    let mut best: Option<&Value> = None;
    for v in values {
        if v.is_missing() {
            return Ok(Value::Missing);
        }
        if let Value::Numeric(n) = v {
            if n.is_nan() {
                return Ok(v.clone());
            }
        }
        best = Some(match best {
            None => v,
            Some(b) => {
                let ordering = v.compare(b).ok_or_else(|| {
                    EvalError::TypeMismatch(format!(
                        "{}() over mixed {} and {} values",
                        func,
                        b.data_type(),
                        v.data_type()
                    ))
                })?;
                let wanted = if func == Aggregate::Max {
                    Ordering::Greater
                } else {
                    Ordering::Less
                };
                if ordering == wanted { v } else { b }
            }
        });
    }
    Ok(best.cloned().unwrap_or(Value::Missing))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{Column, Dataset, Schema};

    fn dataset() -> Dataset {
        let schema = Schema::new(vec![
            Column::discrete("type"),
            Column::continuous("value"),
            Column::discrete("flag"),
        ])
        .unwrap();
        Dataset::new(
            schema,
            vec![
                vec!["a".into(), 10.0.into(), true.into()],
                vec!["a".into(), 25.0.into(), false.into()],
                vec!["a".into(), Value::Missing, true.into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn aggregates_reduce_to_one_value() {
        let data = dataset();
        let rows = [0, 1];
        let frame = data.frame(&rows);
        assert_eq!(col("value").max().evaluate(&frame).unwrap(), vec![Value::from(25.0)]);
        assert_eq!(col("flag").mean().evaluate(&frame).unwrap(), vec![Value::from(0.5)]);
        assert_eq!(col("value").max().gt(20).evaluate(&frame).unwrap(), vec![Value::from(true)]);
    }

    #[test]
    fn row_level_comparison_broadcasts() {
        let data = dataset();
        let rows = [0, 1, 2];
        let frame = data.frame(&rows);
        let out = col("value").gt(20).evaluate(&frame).unwrap();
        assert_eq!(out, vec![Value::from(false), Value::from(true), Value::Missing]);
    }

    #[test]
    fn missing_propagates_through_max() {
        let data = dataset();
        let rows = [0, 1, 2];
        let frame = data.frame(&rows);
        assert_eq!(col("value").max().evaluate(&frame).unwrap(), vec![Value::Missing]);
    }

    #[test]
    fn three_valued_and() {
        let data = dataset();
        let rows = [2];
        let frame = data.frame(&rows);
        let e = col("value").gt(1).and(col("flag").eq(false));
        assert_eq!(e.evaluate(&frame).unwrap(), vec![Value::from(false)]);
    }

    #[test]
    fn comparing_text_with_number_fails() {
        let data = dataset();
        let rows = [0];
        let frame = data.frame(&rows);
        let err = col("type").gt(3).evaluate(&frame).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch(_)));
    }

    #[test]
    fn renders_source_text() {
        let e = col("value").max().gt(15).and(col("flag").mean().gt(0.55));
        assert_eq!(e.to_string(), "max(value) > 15 & mean(flag) > 0.55");
        assert_eq!(e.columns(), vec!["value".to_string(), "flag".to_string()]);
        assert!(e.is_logical());
        assert!(!col("value").max().is_logical());
    }
}
