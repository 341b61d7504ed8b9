//! Validated query representation
//!
//! Built once by the validator; the evaluator never re-inspects JSON.

use std::fmt;

use crate::model::{dataset_key, Field, FieldClass};

/// A dataset-qualified key such as `sections_avg`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    dataset: String,
    field: Field,
    qualified: String,
}

impl FieldKey {
    pub fn new(dataset: impl Into<String>, field: Field) -> Self {
        let dataset = dataset.into();
        let qualified = dataset_key(&dataset, field);
        Self {
            dataset,
            field,
            qualified,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn class(&self) -> FieldClass {
        self.field.class()
    }

    /// The key as it appears in records
    pub fn as_str(&self) -> &str {
        &self.qualified
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified)
    }
}

/// Numeric comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Gt,
    Eq,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Lt => "LT",
            Comparator::Gt => "GT",
            Comparator::Eq => "EQ",
        }
    }

    /// Applies `record_value <op> literal`
    pub fn holds(&self, record_value: f64, literal: f64) -> bool {
        match self {
            Comparator::Lt => record_value < literal,
            Comparator::Gt => record_value > literal,
            Comparator::Eq => record_value == literal,
        }
    }
}

/// Wildcard literal accepted by `IS`.
///
/// Asterisks may only lead or trail the literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WildcardPattern {
    /// `*` or `**`
    Any,
    /// `*x*`
    Contains(String),
    /// `x*`
    Prefix(String),
    /// `*x`
    Suffix(String),
    /// `x`
    Exact(String),
}

impl WildcardPattern {
    pub fn parse(literal: &str) -> Result<Self, String> {
        if literal.matches('*').count() > 2 {
            return Err(format!("Too many asterisks in '{}'", literal));
        }
        if literal == "*" || literal == "**" {
            return Ok(WildcardPattern::Any);
        }

        let leading = literal.starts_with('*');
        let trailing = literal.ends_with('*');
        let start = usize::from(leading);
        let end = literal.len() - usize::from(trailing);
        let inner = &literal[start..end];

        if inner.contains('*') {
            return Err(format!(
                "Asterisks may only lead or trail the literal: '{}'",
                literal
            ));
        }

        let inner = inner.to_string();
        Ok(match (leading, trailing) {
            (true, true) => WildcardPattern::Contains(inner),
            (true, false) => WildcardPattern::Suffix(inner),
            (false, true) => WildcardPattern::Prefix(inner),
            (false, false) => WildcardPattern::Exact(inner),
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            WildcardPattern::Any => true,
            WildcardPattern::Contains(s) => value.contains(s.as_str()),
            WildcardPattern::Prefix(s) => value.starts_with(s.as_str()),
            WildcardPattern::Suffix(s) => value.ends_with(s.as_str()),
            WildcardPattern::Exact(s) => value == s,
        }
    }
}

/// WHERE tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `{}`: every record matches
    All,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Compare {
        op: Comparator,
        key: FieldKey,
        value: f64,
    },
    Is {
        key: FieldKey,
        pattern: WildcardPattern,
    },
}

/// Sort direction for object-form ORDER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(Direction::Up),
            "DOWN" => Some(Direction::Down),
            _ => None,
        }
    }
}

/// ORDER clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSpec {
    /// Ascending by one column
    Key(String),
    /// By several columns in priority order, one direction for all
    Keys { dir: Direction, keys: Vec<String> },
}

impl OrderSpec {
    pub fn keys(&self) -> &[String] {
        match self {
            OrderSpec::Key(key) => std::slice::from_ref(key),
            OrderSpec::Keys { keys, .. } => keys,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            OrderSpec::Key(_) => Direction::Up,
            OrderSpec::Keys { dir, .. } => *dir,
        }
    }
}

/// Aggregate function of an APPLY rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Count,
    Sum,
}

impl ApplyToken {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MAX" => Some(ApplyToken::Max),
            "MIN" => Some(ApplyToken::Min),
            "AVG" => Some(ApplyToken::Avg),
            "COUNT" => Some(ApplyToken::Count),
            "SUM" => Some(ApplyToken::Sum),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyToken::Max => "MAX",
            ApplyToken::Min => "MIN",
            ApplyToken::Avg => "AVG",
            ApplyToken::Count => "COUNT",
            ApplyToken::Sum => "SUM",
        }
    }

    /// COUNT accepts either class; every other token needs a numeric key
    pub fn accepts(&self, class: FieldClass) -> bool {
        *self == ApplyToken::Count || class == FieldClass::Numeric
    }
}

/// `{name: {TOKEN: key}}`
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRule {
    pub name: String,
    pub token: ApplyToken,
    pub target: FieldKey,
}

/// TRANSFORMATIONS clause
#[derive(Debug, Clone, PartialEq)]
pub struct Transformations {
    pub group: Vec<FieldKey>,
    pub apply: Vec<ApplyRule>,
}

/// A validated query over exactly one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub dataset_id: String,
    pub filter: Filter,
    pub columns: Vec<String>,
    pub order: Option<OrderSpec>,
    pub transformations: Option<Transformations>,
}
