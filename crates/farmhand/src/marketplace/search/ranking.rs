use std::cmp::Ordering;

use super::super::domain::Worker;
use super::criteria::{SearchCriteria, SortKey, SortOrder};

pub(crate) fn matches(worker: &Worker, criteria: &SearchCriteria) -> bool {
    let query = criteria.query.trim();
    if !query.is_empty() {
        let needle = query.to_lowercase();
        let in_name = worker.name.to_lowercase().contains(&needle);
        let in_location = worker.location.to_lowercase().contains(&needle);
        let in_skills = worker
            .skills
            .iter()
            .any(|skill| skill.to_lowercase().contains(&needle));
        if !(in_name || in_location || in_skills) {
            return false;
        }
    }

    if !criteria.required_skills.is_empty()
        && criteria.required_skills.is_disjoint(&worker.skills)
    {
        return false;
    }

    if !criteria.price_range.contains(worker.daily_rate) {
        return false;
    }

    if worker.rating < criteria.min_rating {
        return false;
    }

    // Workers without a known distance are never excluded here.
    if let Some(distance) = worker.distance_km {
        if distance > criteria.max_distance_km {
            return false;
        }
    }

    !(criteria.available_only && !worker.is_available)
}

pub(crate) fn compare(a: &Worker, b: &Worker, key: SortKey, order: SortOrder) -> Ordering {
    let ordering = match key {
        SortKey::Rating => a.rating.total_cmp(&b.rating),
        SortKey::Price => a.daily_rate.cmp(&b.daily_rate),
        SortKey::Experience => a.experience_years.cmp(&b.experience_years),
        SortKey::Distance => a
            .distance_km
            .unwrap_or(0.0)
            .total_cmp(&b.distance_km.unwrap_or(0.0)),
    };

    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}
