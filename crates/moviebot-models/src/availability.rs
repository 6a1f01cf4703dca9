use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a title can be watched in one region.
///
/// Provider names keep the API's display-priority order and contain no duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegionAvailability {
    pub subscription: Vec<String>,
    pub rent: Vec<String>,
    pub buy: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl RegionAvailability {
    pub fn is_empty(&self) -> bool {
        self.subscription.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}

/// Watch-provider availability keyed by ISO 3166-1 region code ("US", "UZ", ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityInfo {
    pub regions: HashMap<String, RegionAvailability>,
}

impl AvailabilityInfo {
    pub fn region(&self, code: &str) -> Option<&RegionAvailability> {
        self.regions.get(code)
    }
}
