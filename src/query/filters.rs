//! Filter evaluation
//!
//! Evaluates a validated WHERE tree against one record. A record without
//! the referenced field, or with a value of the wrong class, never matches
//! a comparison.

use crate::model::Record;

use super::ast::Filter;

/// Evaluates filter trees against records
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns true if the record satisfies the filter
    pub fn matches(filter: &Filter, record: &Record) -> bool {
        match filter {
            Filter::All => true,
            Filter::And(children) => children.iter().all(|c| Self::matches(c, record)),
            Filter::Or(children) => children.iter().any(|c| Self::matches(c, record)),
            Filter::Not(child) => !Self::matches(child, record),
            Filter::Compare { op, key, value } => record
                .get(key.as_str())
                .and_then(|v| v.as_number())
                .map_or(false, |actual| op.holds(actual, *value)),
            Filter::Is { key, pattern } => record
                .get(key.as_str())
                .and_then(|v| v.as_text())
                .map_or(false, |actual| pattern.matches(actual)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Scalar};
    use crate::query::ast::{Comparator, FieldKey, WildcardPattern};

    fn section(dept: &str, avg: f64) -> Record {
        let mut record = Record::new();
        record.insert("s_dept".into(), Scalar::text(dept));
        record.insert("s_avg".into(), Scalar::Number(avg));
        record
    }

    fn gt(value: f64) -> Filter {
        Filter::Compare {
            op: Comparator::Gt,
            key: FieldKey::new("s", Field::Avg),
            value,
        }
    }

    fn is(pattern: &str) -> Filter {
        Filter::Is {
            key: FieldKey::new("s", Field::Dept),
            pattern: WildcardPattern::parse(pattern).unwrap(),
        }
    }

    #[test]
    fn test_match_all() {
        assert!(FilterEvaluator::matches(&Filter::All, &section("cpsc", 1.0)));
        assert!(FilterEvaluator::matches(&Filter::All, &Record::new()));
    }

    #[test]
    fn test_comparisons() {
        let record = section("cpsc", 90.0);
        assert!(FilterEvaluator::matches(&gt(89.0), &record));
        assert!(!FilterEvaluator::matches(&gt(90.0), &record));

        let eq = Filter::Compare {
            op: Comparator::Eq,
            key: FieldKey::new("s", Field::Avg),
            value: 90.0,
        };
        assert!(FilterEvaluator::matches(&eq, &record));

        let lt = Filter::Compare {
            op: Comparator::Lt,
            key: FieldKey::new("s", Field::Avg),
            value: 90.5,
        };
        assert!(FilterEvaluator::matches(&lt, &record));
    }

    #[test]
    fn test_logic() {
        let record = section("cpsc", 90.0);
        let both = Filter::And(vec![gt(80.0), is("cp*")]);
        assert!(FilterEvaluator::matches(&both, &record));

        let either = Filter::Or(vec![gt(95.0), is("math")]);
        assert!(!FilterEvaluator::matches(&either, &record));

        let negated = Filter::Not(Box::new(either));
        assert!(FilterEvaluator::matches(&negated, &record));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let mut record = Record::new();
        record.insert("s_title".into(), Scalar::text("intro"));

        assert!(!FilterEvaluator::matches(&gt(0.0), &record));
        assert!(!FilterEvaluator::matches(&is("*"), &record));
        // NOT inverts the missing-field result like any other
        assert!(FilterEvaluator::matches(&Filter::Not(Box::new(gt(0.0))), &record));
    }

    #[test]
    fn test_wrong_value_class_never_matches() {
        let mut record = Record::new();
        record.insert("s_avg".into(), Scalar::text("90"));
        record.insert("s_dept".into(), Scalar::Number(1.0));

        assert!(!FilterEvaluator::matches(&gt(0.0), &record));
        assert!(!FilterEvaluator::matches(&is("*"), &record));
    }
}
