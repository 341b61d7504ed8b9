//! GROUP + APPLY transformation
//!
//! Groups keep the first-seen order of the input. SUM and AVG accumulate in
//! `Decimal` and round half away from zero to two places at the end.
//! Sentinel-year rows (`year == 1900`) are aggregated like any other row.

use std::collections::{HashMap, HashSet};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{Record, Scalar, ScalarKey};

use super::ast::{ApplyRule, ApplyToken, FieldKey, Transformations};

/// Group-and-aggregate engine
pub struct Aggregator;

impl Aggregator {
    /// Applies GROUP and APPLY, producing one record per group.
    ///
    /// Each output record holds the group keys with their shared values and
    /// one entry per APPLY rule. A rule with nothing to aggregate (no value
    /// of the right class in the group) is left out of the record.
    pub fn transform(records: &[&Record], transformations: &Transformations) -> Vec<Record> {
        Self::group(records, &transformations.group)
            .into_iter()
            .map(|members| {
                let mut out = Record::new();
                if let Some(first) = members.first() {
                    for key in &transformations.group {
                        if let Some(value) = first.get(key.as_str()) {
                            out.insert(key.as_str().to_string(), value.clone());
                        }
                    }
                }
                for rule in &transformations.apply {
                    if let Some(value) = Self::apply(rule, &members) {
                        out.insert(rule.name.clone(), value);
                    }
                }
                out
            })
            .collect()
    }

    /// Partitions records by the tuple of their group-key values
    pub fn group<'r>(records: &[&'r Record], keys: &[FieldKey]) -> Vec<Vec<&'r Record>> {
        let mut index: HashMap<Vec<Option<ScalarKey>>, usize> = HashMap::new();
        let mut groups: Vec<Vec<&'r Record>> = Vec::new();

        for &record in records {
            let tuple: Vec<Option<ScalarKey>> = keys
                .iter()
                .map(|k| record.get(k.as_str()).map(Scalar::key))
                .collect();
            match index.get(&tuple) {
                Some(&slot) => groups[slot].push(record),
                None => {
                    index.insert(tuple, groups.len());
                    groups.push(vec![record]);
                }
            }
        }

        groups
    }

    /// Computes one APPLY rule over a group
    pub fn apply(rule: &ApplyRule, group: &[&Record]) -> Option<Scalar> {
        let key = rule.target.as_str();
        match rule.token {
            ApplyToken::Count => {
                let distinct: HashSet<ScalarKey> = group
                    .iter()
                    .filter_map(|r| r.get(key))
                    .map(Scalar::key)
                    .collect();
                Some(Scalar::Number(distinct.len() as f64))
            }
            ApplyToken::Max => Self::numbers(group, key)
                .reduce(f64::max)
                .map(Scalar::Number),
            ApplyToken::Min => Self::numbers(group, key)
                .reduce(f64::min)
                .map(Scalar::Number),
            ApplyToken::Sum => {
                let (sum, _) = Self::decimal_sum(group, key)?;
                Self::rounded(sum)
            }
            ApplyToken::Avg => {
                let (sum, count) = Self::decimal_sum(group, key)?;
                Self::rounded(sum.checked_div(Decimal::from(count))?)
            }
        }
    }

    fn numbers<'a>(group: &'a [&'a Record], key: &'a str) -> impl Iterator<Item = f64> + 'a {
        group
            .iter()
            .filter_map(move |r| r.get(key))
            .filter_map(Scalar::as_number)
    }

    /// Decimal sum and count of the numeric values under `key`.
    ///
    /// Each value enters through its shortest decimal text so that `0.1`
    /// is exactly one tenth.
    fn decimal_sum(group: &[&Record], key: &str) -> Option<(Decimal, usize)> {
        let mut sum = Decimal::ZERO;
        let mut count = 0usize;
        for n in Self::numbers(group, key) {
            let value: Decimal = n.to_string().parse().ok()?;
            sum = sum.checked_add(value)?;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some((sum, count))
    }

    fn rounded(value: Decimal) -> Option<Scalar> {
        value
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_string()
            .parse::<f64>()
            .ok()
            .map(Scalar::Number)
    }
}
