//! Query validator
//!
//! Checks a JSON query document against the grammar and builds the typed
//! [`Query`]. Every check is a distinct failure; validation stops at the
//! first one.
//!
//! Grammar:
//! - top level: exactly `WHERE` and `OPTIONS`, optionally `TRANSFORMATIONS`
//! - `WHERE`: `{}` or one filter node
//! - filter node: `AND`/`OR` (non-empty array), `NOT` (object),
//!   `LT`/`GT`/`EQ` (`{mkey: number}`), `IS` (`{skey: string}`)
//! - `OPTIONS`: `COLUMNS` (non-empty array), optional `ORDER`
//! - `TRANSFORMATIONS`: `GROUP` (non-empty array), `APPLY` (array of rules)
//!
//! All dataset-qualified keys must name one dataset, and it must exist.

use std::collections::{BTreeSet, HashSet};

use serde_json::{Map, Value};

use crate::model::{Field, FieldClass};

use super::ast::{
    ApplyRule, ApplyToken, Comparator, Direction, FieldKey, Filter, OrderSpec, Query,
    Transformations, WildcardPattern,
};
use super::errors::{QueryError, QueryResult};

/// Read-only view of which datasets exist
pub trait DatasetCatalog {
    fn dataset_exists(&self, id: &str) -> bool;
}

impl DatasetCatalog for HashSet<String> {
    fn dataset_exists(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl DatasetCatalog for BTreeSet<String> {
    fn dataset_exists(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// Validates query documents against a dataset catalog
pub struct QueryValidator<'a, C: DatasetCatalog + ?Sized> {
    catalog: &'a C,
}

/// Dataset ids referenced anywhere in the query
#[derive(Default)]
struct DatasetRefs {
    ids: BTreeSet<String>,
}

impl DatasetRefs {
    fn note(&mut self, key: &FieldKey) {
        self.ids.insert(key.dataset().to_string());
    }

    fn single(self) -> QueryResult<String> {
        let mut ids = self.ids.into_iter();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Ok(id),
            (None, _) => Err(QueryError::invalid("Query does not reference any dataset")),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(ids);
                Err(QueryError::MultipleDatasets(all))
            }
        }
    }
}

impl<'a, C: DatasetCatalog + ?Sized> QueryValidator<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Validates a query document and returns its typed form.
    pub fn validate(&self, document: &Value) -> QueryResult<Query> {
        let top = as_object("Query", document)?;
        for key in top.keys() {
            if !matches!(key.as_str(), "WHERE" | "OPTIONS" | "TRANSFORMATIONS") {
                return Err(QueryError::invalid(format!("Unexpected top-level key '{}'", key)));
            }
        }
        let where_value = top
            .get("WHERE")
            .ok_or_else(|| QueryError::invalid("Missing WHERE"))?;
        let options_value = top
            .get("OPTIONS")
            .ok_or_else(|| QueryError::invalid("Missing OPTIONS"))?;

        let mut refs = DatasetRefs::default();

        let where_obj = as_object("WHERE", where_value)?;
        let filter = if where_obj.is_empty() {
            Filter::All
        } else {
            parse_filter(where_value, &mut refs)?
        };

        let options = as_object("OPTIONS", options_value)?;
        for key in options.keys() {
            if !matches!(key.as_str(), "COLUMNS" | "ORDER") {
                return Err(QueryError::invalid(format!("Unexpected OPTIONS key '{}'", key)));
            }
        }
        let columns = parse_columns(options.get("COLUMNS"))?;

        let transformations = match top.get("TRANSFORMATIONS") {
            Some(value) => Some(parse_transformations(value, &columns, &mut refs)?),
            None => None,
        };

        match &transformations {
            Some(t) => {
                for column in &columns {
                    let in_group = t.group.iter().any(|k| k.as_str() == column);
                    let in_apply = t.apply.iter().any(|r| &r.name == column);
                    if !in_group && !in_apply {
                        return Err(QueryError::invalid(format!(
                            "COLUMNS entry '{}' must be a GROUP key or an APPLY name",
                            column
                        )));
                    }
                }
            }
            None => {
                for column in &columns {
                    let key = parse_key(column)?;
                    refs.note(&key);
                }
            }
        }

        let order = match options.get("ORDER") {
            Some(value) => Some(parse_order(value, &columns)?),
            None => None,
        };

        let dataset_id = refs.single()?;
        if !self.catalog.dataset_exists(&dataset_id) {
            return Err(QueryError::UnknownDataset(dataset_id));
        }

        Ok(Query {
            dataset_id,
            filter,
            columns,
            order,
            transformations,
        })
    }
}

fn as_object<'v>(what: &str, value: &'v Value) -> QueryResult<&'v Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| QueryError::invalid(format!("{} must be an object", what)))
}

fn as_array<'v>(what: &str, value: &'v Value) -> QueryResult<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| QueryError::invalid(format!("{} must be an array", what)))
}

/// Returns the single entry of an object that must have exactly one key
fn single_entry<'v>(what: &str, value: &'v Value) -> QueryResult<(&'v String, &'v Value)> {
    let obj = as_object(what, value)?;
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(QueryError::invalid(format!(
            "{} must have exactly one key, found {}",
            what,
            obj.len()
        ))),
    }
}

/// Splits `datasetId_field` into a typed key
fn parse_key(key: &str) -> QueryResult<FieldKey> {
    let parts: Vec<&str> = key.split('_').collect();
    if parts.len() != 2 {
        return Err(QueryError::invalid(format!(
            "Key '{}' must have the form datasetId_field",
            key
        )));
    }
    if parts[0].is_empty() {
        return Err(QueryError::invalid(format!("Key '{}' has no dataset id", key)));
    }
    let field = Field::parse(parts[1])
        .ok_or_else(|| QueryError::invalid(format!("Unknown field '{}' in key '{}'", parts[1], key)))?;
    Ok(FieldKey::new(parts[0], field))
}

fn parse_filter(value: &Value, refs: &mut DatasetRefs) -> QueryResult<Filter> {
    let (op, payload) = single_entry("Filter", value)?;

    match op.as_str() {
        "AND" | "OR" => {
            let items = as_array(op, payload)?;
            if items.is_empty() {
                return Err(QueryError::invalid(format!("{} must not be empty", op)));
            }
            let children = items
                .iter()
                .map(|item| parse_filter(item, refs))
                .collect::<QueryResult<Vec<_>>>()?;
            Ok(if op == "AND" {
                Filter::And(children)
            } else {
                Filter::Or(children)
            })
        }
        "NOT" => {
            as_object("NOT", payload)?;
            Ok(Filter::Not(Box::new(parse_filter(payload, refs)?)))
        }
        "LT" | "GT" | "EQ" => {
            let comparator = match op.as_str() {
                "LT" => Comparator::Lt,
                "GT" => Comparator::Gt,
                _ => Comparator::Eq,
            };
            let (raw_key, literal) = single_entry(op, payload)?;
            let key = parse_key(raw_key)?;
            if key.class() != FieldClass::Numeric {
                return Err(QueryError::invalid(format!(
                    "{} requires a numeric key, got '{}'",
                    op, raw_key
                )));
            }
            let value = literal
                .as_f64()
                .ok_or_else(|| QueryError::invalid(format!("{} value must be a number", op)))?;
            refs.note(&key);
            Ok(Filter::Compare {
                op: comparator,
                key,
                value,
            })
        }
        "IS" => {
            let (raw_key, literal) = single_entry("IS", payload)?;
            let key = parse_key(raw_key)?;
            if key.class() != FieldClass::Text {
                return Err(QueryError::invalid(format!(
                    "IS requires a string key, got '{}'",
                    raw_key
                )));
            }
            let literal = literal
                .as_str()
                .ok_or_else(|| QueryError::invalid("IS value must be a string"))?;
            let pattern = WildcardPattern::parse(literal).map_err(QueryError::Invalid)?;
            refs.note(&key);
            Ok(Filter::Is { key, pattern })
        }
        other => Err(QueryError::invalid(format!("Unknown filter operator '{}'", other))),
    }
}

fn parse_columns(value: Option<&Value>) -> QueryResult<Vec<String>> {
    let value = value.ok_or_else(|| QueryError::invalid("OPTIONS must contain COLUMNS"))?;
    let items = as_array("COLUMNS", value)?;
    if items.is_empty() {
        return Err(QueryError::invalid("COLUMNS must not be empty"));
    }
    items
        .iter()
        .map(|item| {
            item.as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| QueryError::invalid("COLUMNS entries must be non-empty strings"))
        })
        .collect()
}

fn parse_order(value: &Value, columns: &[String]) -> QueryResult<OrderSpec> {
    let in_columns = |key: &str| columns.iter().any(|c| c == key);

    match value {
        Value::String(key) => {
            if !in_columns(key) {
                return Err(QueryError::invalid(format!("ORDER key '{}' must be in COLUMNS", key)));
            }
            Ok(OrderSpec::Key(key.clone()))
        }
        Value::Object(obj) => {
            for key in obj.keys() {
                if !matches!(key.as_str(), "dir" | "keys") {
                    return Err(QueryError::invalid(format!("Unexpected ORDER key '{}'", key)));
                }
            }
            let dir = obj
                .get("dir")
                .and_then(Value::as_str)
                .and_then(Direction::parse)
                .ok_or_else(|| QueryError::invalid("ORDER dir must be 'UP' or 'DOWN'"))?;
            let raw_keys = obj
                .get("keys")
                .ok_or_else(|| QueryError::invalid("ORDER must contain keys"))?;
            let raw_keys = as_array("ORDER keys", raw_keys)?;
            if raw_keys.is_empty() {
                return Err(QueryError::invalid("ORDER keys must not be empty"));
            }
            let mut keys = Vec::with_capacity(raw_keys.len());
            for raw in raw_keys {
                let key = raw
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("ORDER keys must be strings"))?;
                if !in_columns(key) {
                    return Err(QueryError::invalid(format!(
                        "ORDER key '{}' must be in COLUMNS",
                        key
                    )));
                }
                keys.push(key.to_string());
            }
            Ok(OrderSpec::Keys { dir, keys })
        }
        _ => Err(QueryError::invalid("ORDER must be a string or an object")),
    }
}

fn parse_transformations(
    value: &Value,
    columns: &[String],
    refs: &mut DatasetRefs,
) -> QueryResult<Transformations> {
    let obj = as_object("TRANSFORMATIONS", value)?;
    for key in obj.keys() {
        if !matches!(key.as_str(), "GROUP" | "APPLY") {
            return Err(QueryError::invalid(format!(
                "Unexpected TRANSFORMATIONS key '{}'",
                key
            )));
        }
    }

    let group_value = obj
        .get("GROUP")
        .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS must contain GROUP"))?;
    let group_items = as_array("GROUP", group_value)?;
    if group_items.is_empty() {
        return Err(QueryError::invalid("GROUP must not be empty"));
    }
    let mut group = Vec::with_capacity(group_items.len());
    for item in group_items {
        let raw = item
            .as_str()
            .ok_or_else(|| QueryError::invalid("GROUP entries must be strings"))?;
        let key = parse_key(raw)?;
        if !columns.iter().any(|c| c == raw) {
            return Err(QueryError::invalid(format!("GROUP key '{}' must be in COLUMNS", raw)));
        }
        refs.note(&key);
        group.push(key);
    }

    let apply_value = obj
        .get("APPLY")
        .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS must contain APPLY"))?;
    let apply_items = as_array("APPLY", apply_value)?;
    let mut apply: Vec<ApplyRule> = Vec::with_capacity(apply_items.len());
    for item in apply_items {
        let rule = parse_apply_rule(item)?;
        if apply.iter().any(|r| r.name == rule.name) {
            return Err(QueryError::invalid(format!("Duplicate APPLY name '{}'", rule.name)));
        }
        refs.note(&rule.target);
        apply.push(rule);
    }

    Ok(Transformations { group, apply })
}

fn parse_apply_rule(value: &Value) -> QueryResult<ApplyRule> {
    let (name, body) = single_entry("APPLY rule", value)?;
    if name.is_empty() || name.contains('_') {
        return Err(QueryError::invalid(format!(
            "APPLY name '{}' must be non-empty and contain no underscore",
            name
        )));
    }

    let (raw_token, target) = single_entry("APPLY rule body", body)?;
    let token = ApplyToken::parse(raw_token).ok_or_else(|| {
        QueryError::invalid(format!(
            "APPLY token '{}' must be one of MAX, MIN, AVG, COUNT, SUM",
            raw_token
        ))
    })?;
    let raw_target = target
        .as_str()
        .ok_or_else(|| QueryError::invalid("APPLY target must be a key string"))?;
    let target = parse_key(raw_target)?;
    if !token.accepts(target.class()) {
        return Err(QueryError::invalid(format!(
            "{} requires a numeric key, got '{}'",
            token.as_str(),
            raw_target
        )));
    }

    Ok(ApplyRule {
        name: name.clone(),
        token,
        target,
    })
}
