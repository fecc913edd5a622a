//! Per-column validity rules.
//!
//! Every ruled column is evaluated on its own: a value is invalid when it
//! breaks any active rule of its column, and each (row, column) violation
//! yields one [`InvalidRecord`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use dq_common::{Scalar, column_scalars};
use polars::prelude::DataFrame;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CheckError, CheckResult, Side};
use crate::report::{CheckKind, FailureReport, InvalidRecord, Pass, RuleKind};

/// Custom validity test; returns true for valid values.
pub type Predicate = Arc<dyn Fn(&Scalar) -> bool + Send + Sync>;

/// Rules for one column. Unset rules are inactive.
#[derive(Clone, Default)]
pub struct ColumnRule {
    min: Option<Scalar>,
    max: Option<Scalar>,
    allowed_values: Option<Vec<Scalar>>,
    pattern: Option<Regex>,
    condition: Option<Predicate>,
}

impl ColumnRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn min(mut self, bound: impl Into<Scalar>) -> Self {
        self.min = Some(bound.into());
        self
    }

    /// Inclusive upper bound.
    pub fn max(mut self, bound: impl Into<Scalar>) -> Self {
        self.max = Some(bound.into());
        self
    }

    pub fn allowed_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Regular expression the whole text form of a value must match.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }

    pub fn condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Scalar) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(predicate));
        self
    }

    /// True when no rule is set.
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && self.allowed_values.is_none()
            && self.pattern.is_none()
            && self.condition.is_none()
    }

    /// Rules broken by `value`, in rule order.
    pub fn violations(&self, value: &Scalar) -> Vec<RuleKind> {
        let mut broken = Vec::new();

        if let Some(min) = &self.min
            && breaks_bound(value, min, Ordering::Less)
        {
            broken.push(RuleKind::Min);
        }
        if let Some(max) = &self.max
            && breaks_bound(value, max, Ordering::Greater)
        {
            broken.push(RuleKind::Max);
        }
        if let Some(allowed) = &self.allowed_values
            && !is_allowed(value, allowed)
        {
            broken.push(RuleKind::AllowedValues);
        }
        if let Some(pattern) = &self.pattern {
            let matched = value.to_text().is_some_and(|text| pattern.is_match(&text));
            if !matched {
                broken.push(RuleKind::Pattern);
            }
        }
        if let Some(condition) = &self.condition
            && !condition(value)
        {
            broken.push(RuleKind::Condition);
        }
        broken
    }
}

/// Nulls never break a bound; values that cannot be compared always do.
fn breaks_bound(value: &Scalar, bound: &Scalar, outside: Ordering) -> bool {
    if value.is_missing() {
        return false;
    }
    match value.compare_coerced(bound) {
        Some(ordering) => ordering == outside,
        None => true,
    }
}

fn is_allowed(value: &Scalar, allowed: &[Scalar]) -> bool {
    if value.is_missing() {
        return allowed.iter().any(Scalar::is_missing);
    }
    allowed
        .iter()
        .any(|candidate| value == candidate || value.compare_coerced(candidate) == Some(Ordering::Equal))
}

impl fmt::Debug for ColumnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnRule")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("allowed_values", &self.allowed_values)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("condition", &self.condition.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Serializable form of a [`ColumnRule`], as written in suite files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub min: Option<Scalar>,
    #[serde(default)]
    pub max: Option<Scalar>,
    #[serde(default)]
    pub allowed_values: Option<Vec<Scalar>>,
    #[serde(default)]
    pub pattern: Option<String>,
}

impl RuleSpec {
    /// Builds the rule for `column`.
    pub fn compile(&self, column: &str) -> Result<ColumnRule, CheckError> {
        let mut rule = ColumnRule::new();
        if let Some(min) = &self.min {
            rule = rule.min(min.clone());
        }
        if let Some(max) = &self.max {
            rule = rule.max(max.clone());
        }
        if let Some(values) = &self.allowed_values {
            rule = rule.allowed_values(values.iter().cloned());
        }
        if let Some(pattern) = &self.pattern {
            rule = rule.pattern(pattern).map_err(|e| CheckError::InvalidRule {
                column: column.to_string(),
                reason: e.to_string(),
            })?;
        }
        if rule.is_empty() {
            return Err(CheckError::InvalidRule {
                column: column.to_string(),
                reason: "no rule given".to_string(),
            });
        }
        Ok(rule)
    }
}

/// Ordered mapping of column name to rule.
#[derive(Debug, Clone, Default)]
pub struct ColumnRules {
    rules: Vec<(String, ColumnRule)>,
}

impl ColumnRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, replacing any earlier rule for the same column.
    pub fn with(mut self, column: impl Into<String>, rule: ColumnRule) -> Self {
        self.insert(column, rule);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, rule: ColumnRule) {
        let column = column.into();
        match self.rules.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = rule,
            None => self.rules.push((column, rule)),
        }
    }

    /// Compiles suite-file rule specs.
    pub fn from_specs<'a, I>(specs: I) -> Result<Self, CheckError>
    where
        I: IntoIterator<Item = (&'a str, &'a RuleSpec)>,
    {
        let mut rules = Self::new();
        for (column, spec) in specs {
            rules.insert(column, spec.compile(column)?);
        }
        Ok(rules)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Checks every ruled column of `df`.
pub fn check_column_validity(df: &DataFrame, rules: &ColumnRules) -> CheckResult {
    let records = find_invalid_values(df, rules)?;
    if records.is_empty() {
        Ok(Pass::new(CheckKind::ColumnValidity, df.height()))
    } else {
        Err(FailureReport::InvalidValues { records }.into())
    }
}

/// Values violating their column's rule, grouped by column in rule order.
///
/// Every ruled column must exist; this is checked before any value is read.
pub fn find_invalid_values(
    df: &DataFrame,
    rules: &ColumnRules,
) -> Result<Vec<InvalidRecord>, CheckError> {
    for (column, _) in rules.iter() {
        if df.column(column).is_err() {
            return Err(CheckError::MissingColumn {
                column: column.to_string(),
                side: Side::Input,
            });
        }
    }

    let mut records = Vec::new();
    for (column, rule) in rules.iter() {
        let before = records.len();
        for (row, value) in column_scalars(df, column)?.into_iter().enumerate() {
            let violations = rule.violations(&value);
            if !violations.is_empty() {
                records.push(InvalidRecord {
                    row,
                    column: column.to_string(),
                    value,
                    violations,
                });
            }
        }
        debug!(column, invalid = records.len() - before, "evaluated column rule");
    }
    Ok(records)
}
