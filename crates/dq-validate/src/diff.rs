//! Row-set difference between two aligned datasets.

use std::collections::{HashMap, HashSet};

use dq_common::Scalar;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::align::{AlignOptions, AlignedPair, align_with};
use crate::error::CheckResult;
use crate::report::{CheckKind, DiffGroup, FailureReport, Pass, Provenance};

/// Checks that `source` and `target` hold the same row tuples.
///
/// Columns are aligned first (see [`crate::align`]). An empty `columns`
/// slice compares every column of `source`. Membership is set-based: a tuple
/// present on both sides passes whatever its multiplicity, so pair this with
/// [`crate::check_row_count`] when counts matter.
pub fn check_full_match(source: &DataFrame, target: &DataFrame, columns: &[&str]) -> CheckResult {
    check_full_match_with(source, target, columns, &AlignOptions::default())
}

/// [`check_full_match`] with per-column comparison type overrides.
pub fn check_full_match_with(
    source: &DataFrame,
    target: &DataFrame,
    columns: &[&str],
    options: &AlignOptions,
) -> CheckResult {
    let aligned = align_with(source, target, columns, options)?;
    let groups = diff_rows(&aligned);
    let rows_examined = aligned.source.len() + aligned.target.len();

    if groups.is_empty() {
        return Ok(Pass::new(CheckKind::FullMatch, rows_examined));
    }

    let count_for = |provenance: Provenance| -> usize {
        groups
            .iter()
            .filter(|g| g.provenance == provenance)
            .map(|g| g.count)
            .sum()
    };
    let source_only = count_for(Provenance::SourceOnly);
    let target_only = count_for(Provenance::TargetOnly);
    debug!(
        groups = groups.len(),
        source_only, target_only, "datasets differ"
    );

    Err(FailureReport::Mismatch {
        columns: aligned.columns,
        groups,
        source_only,
        target_only,
    }
    .into())
}

/// Groups the row tuples present on only one side of an aligned pair.
///
/// Groups are ordered by descending count; ties keep source-side groups
/// first, then order of first appearance.
pub fn diff_rows(aligned: &AlignedPair) -> Vec<DiffGroup> {
    let source_set: HashSet<&[Scalar]> = aligned.source.iter().map(Vec::as_slice).collect();
    let target_set: HashSet<&[Scalar]> = aligned.target.iter().map(Vec::as_slice).collect();

    let mut groups = one_sided_groups(&aligned.source, &target_set, Provenance::SourceOnly);
    groups.extend(one_sided_groups(
        &aligned.target,
        &source_set,
        Provenance::TargetOnly,
    ));
    // stable: preserves side and first-appearance order among equal counts
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

fn one_sided_groups(
    rows: &[Vec<Scalar>],
    other: &HashSet<&[Scalar]>,
    provenance: Provenance,
) -> Vec<DiffGroup> {
    let mut index: HashMap<&[Scalar], usize> = HashMap::new();
    let mut groups: Vec<DiffGroup> = Vec::new();

    for row in rows {
        if other.contains(row.as_slice()) {
            continue;
        }
        match index.get(row.as_slice()) {
            Some(&pos) => groups[pos].count += 1,
            None => {
                index.insert(row.as_slice(), groups.len());
                groups.push(DiffGroup {
                    values: row.clone(),
                    provenance,
                    count: 1,
                });
            }
        }
    }
    groups
}
