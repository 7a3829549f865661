mod criteria;
mod ranking;

pub use criteria::{PriceRange, SearchCriteria, SearchDefaults, SortKey, SortOrder};

use super::domain::Worker;

/// Filter the pool and order the survivors.
///
/// Sorting is stable, so workers that tie on the sort key keep their pool order and
/// repeated searches over an unchanged pool return the same sequence.
pub fn search(pool: &[Worker], criteria: &SearchCriteria) -> Vec<Worker> {
    let mut survivors: Vec<Worker> = pool
        .iter()
        .filter(|worker| ranking::matches(worker, criteria))
        .cloned()
        .collect();

    survivors.sort_by(|a, b| ranking::compare(a, b, criteria.sort_by, criteria.sort_order));
    survivors
}
