//! Package (milestone) ordering.
//!
//! Packages are ranked by earliest due date, then by the version parsed from
//! the milestone name, then by where the package first appears in the
//! project. The rank is advisory input for the scheduler.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::item::WorkItem;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)v?(\d+)\.(\d+)\.(\d+)").expect("invalid milestone version pattern")
});

/// `major.minor.patch` found in a milestone name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MilestoneVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

/// Find a version anywhere in the label, e.g. `v1.2.3` or `Release 2.0.10`.
pub fn parse_version(label: &str) -> Option<MilestoneVersion> {
    let captures = VERSION_PATTERN.captures(label)?;
    let part = |index: usize| captures.get(index)?.as_str().parse::<u64>().ok();
    Some(MilestoneVersion {
        major: part(1)?,
        minor: part(2)?,
        patch: part(3)?,
    })
}

#[derive(Debug, Clone)]
struct PackageInfo {
    id: String,
    due: Option<NaiveDate>,
    version: Option<MilestoneVersion>,
    first_seen: usize,
}

fn compare_packages(a: &PackageInfo, b: &PackageInfo) -> Ordering {
    match (a.due, b.due) {
        (Some(x), Some(y)) if x != y => return x.cmp(&y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => {}
    }
    match (a.version, b.version) {
        (Some(x), Some(y)) if x != y => return x.cmp(&y),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => {}
    }
    a.first_seen.cmp(&b.first_seen)
}

/// Rank per package; ungrouped items rank after every package.
#[derive(Debug, Clone, Default)]
pub struct PackageOrder {
    ordered: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl PackageOrder {
    /// Build from items already in display order.
    pub fn build<'a>(items: impl IntoIterator<Item = &'a WorkItem>) -> Self {
        let mut infos: Vec<PackageInfo> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for (position, item) in items.into_iter().enumerate() {
            let Some(milestone) = package_id(item) else {
                continue;
            };
            let slot = *index_of.entry(milestone.to_string()).or_insert_with(|| {
                infos.push(PackageInfo {
                    id: milestone.to_string(),
                    due: None,
                    version: parse_version(milestone),
                    first_seen: position,
                });
                infos.len() - 1
            });
            if let Some(due) = item.milestone_due_date {
                let info = &mut infos[slot];
                if info.due.map_or(true, |current| due < current) {
                    info.due = Some(due);
                }
            }
        }

        infos.sort_by(compare_packages);
        let ordered: Vec<String> = infos.into_iter().map(|info| info.id).collect();
        let ranks = ordered
            .iter()
            .enumerate()
            .map(|(rank, id)| (id.clone(), rank))
            .collect();
        Self { ordered, ranks }
    }

    /// Rank for the item's package.
    pub fn rank_for(&self, item: &WorkItem) -> usize {
        package_id(item)
            .and_then(|id| self.ranks.get(id).copied())
            .unwrap_or_else(|| self.unpackaged_rank())
    }

    pub fn unpackaged_rank(&self) -> usize {
        self.ordered.len()
    }

    /// Package ids, highest priority first.
    pub fn ordered(&self) -> &[String] {
        &self.ordered
    }
}

/// The item's non-empty milestone.
pub fn package_id(item: &WorkItem) -> Option<&str> {
    item.milestone.as_deref().filter(|milestone| !milestone.is_empty())
}
