//! Label/attribute stat folding for version stat recomputation.
//!
//! Every task row carries a per-label tally of its annotated objects
//! ([`LabelTally`]). Recomputing a version's stats folds the tallies of
//! the version's current member tasks into one [`LabelStat`] list with
//! one-decimal percentages, ordered by descending object count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Per-task input
// ---------------------------------------------------------------------------

/// Object tally for one attribute value under a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTally {
    pub value: String,
    pub object_count: i64,
}

/// Object tally for one label within a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTally {
    pub label: String,
    pub object_count: i64,
    #[serde(default)]
    pub attributes: Vec<AttributeTally>,
}

// ---------------------------------------------------------------------------
// Folded output
// ---------------------------------------------------------------------------

/// Aggregated attribute stats for one label across a whole version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStat {
    pub value: String,
    pub object_count: i64,
    /// Share of the label's objects, one decimal.
    pub percentage: f64,
}

/// Aggregated stats for one label across a whole version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStat {
    pub label_name: String,
    pub total_objects: i64,
    /// Share of the version's objects, one decimal.
    pub percentage: f64,
    pub attributes: Vec<AttributeStat>,
}

// ---------------------------------------------------------------------------
// Folding
// ---------------------------------------------------------------------------

/// Share of `part` in `whole` as a one-decimal percentage.
///
/// Non-zero shares never collapse to 0.0: anything up to a thousandth
/// is ceiled to 0.1, larger shares use ordinary rounding.
fn one_decimal_share(part: i64, whole: i64) -> f64 {
    if whole == 0 || part == 0 {
        return 0.0;
    }
    let pct = part as f64 * 100.0 / whole as f64;
    let ceiled = (pct * 10.0).ceil() / 10.0;
    if ceiled > 0.1 {
        (pct * 10.0).round() / 10.0
    } else {
        ceiled
    }
}

/// Fold per-task label tallies into version-wide label stats.
///
/// Labels (and attribute values within a label) are merged by name;
/// the result is sorted by descending object count.
pub fn fold_label_tallies<'a, I>(tallies: I) -> Vec<LabelStat>
where
    I: IntoIterator<Item = &'a LabelTally>,
{
    // Merge, remembering first-seen order so ties stay stable.
    let mut order: Vec<String> = Vec::new();
    let mut merged: HashMap<String, (i64, Vec<String>, HashMap<String, i64>)> = HashMap::new();

    for tally in tallies {
        let entry = merged.entry(tally.label.clone()).or_insert_with(|| {
            order.push(tally.label.clone());
            (0, Vec::new(), HashMap::new())
        });
        entry.0 += tally.object_count;
        for attribute in &tally.attributes {
            match entry.2.get_mut(&attribute.value) {
                Some(count) => *count += attribute.object_count,
                None => {
                    entry.1.push(attribute.value.clone());
                    entry.2.insert(attribute.value.clone(), attribute.object_count);
                }
            }
        }
    }

    let grand_total: i64 = merged.values().map(|(count, _, _)| count).sum();

    let mut stats: Vec<LabelStat> = order
        .into_iter()
        .map(|label| {
            let (total, attr_order, attr_counts) = merged.remove(&label).unwrap_or_default();
            let attributes = attr_order
                .into_iter()
                .map(|value| {
                    let object_count = attr_counts.get(&value).copied().unwrap_or(0);
                    AttributeStat {
                        percentage: one_decimal_share(object_count, total),
                        value,
                        object_count,
                    }
                })
                .collect();
            LabelStat {
                percentage: one_decimal_share(total, grand_total),
                label_name: label,
                total_objects: total,
                attributes,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.total_objects.cmp(&a.total_objects));
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
