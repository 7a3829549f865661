use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Defaults applied when criteria are reset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchDefaults {
    pub price_ceiling: u32,
    pub max_distance_km: f32,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            price_ceiling: 1000,
            max_distance_km: 50.0,
        }
    }
}

/// Closed daily-rate interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl PriceRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn unbounded() -> Self {
        Self {
            min: 0,
            max: u32::MAX,
        }
    }

    pub fn contains(&self, rate: u32) -> bool {
        self.min <= rate && rate <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Rating,
    Price,
    Experience,
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Farmer-supplied filters and ordering for one search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCriteria {
    pub query: String,
    pub required_skills: BTreeSet<String>,
    pub price_range: PriceRange,
    pub min_rating: f32,
    pub max_distance_km: f32,
    pub available_only: bool,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

impl SearchCriteria {
    /// The canonical empty criteria used on reset.
    pub fn with_defaults(defaults: &SearchDefaults) -> Self {
        Self {
            query: String::new(),
            required_skills: BTreeSet::new(),
            price_range: PriceRange::new(0, defaults.price_ceiling),
            min_rating: 0.0,
            max_distance_km: defaults.max_distance_km,
            available_only: false,
            sort_by: SortKey::Rating,
            sort_order: SortOrder::Desc,
        }
    }

    /// Criteria that keep every worker in the pool.
    pub fn unrestricted(sort_by: SortKey, sort_order: SortOrder) -> Self {
        Self {
            price_range: PriceRange::unbounded(),
            max_distance_km: f32::INFINITY,
            sort_by,
            sort_order,
            ..Self::default()
        }
    }

    pub fn is_filtered(&self, defaults: &SearchDefaults) -> bool {
        *self != Self {
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            ..Self::with_defaults(defaults)
        }
    }
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self::with_defaults(&SearchDefaults::default())
    }
}
