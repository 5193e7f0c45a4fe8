use serde::{Deserialize, Serialize};

use crate::problems::repo::{Problem, ProblemFilters, ProblemStatus};
use crate::problems::validate::{is_known_category, is_known_city};

/// Query-string filters on problem listings. Unknown or "all" values mean
/// "no filter"; valid values compose conjunctively.
#[derive(Debug, Default, Deserialize)]
pub struct ProblemQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl ProblemQuery {
    pub fn into_filters(self) -> ProblemFilters {
        ProblemFilters {
            city: self.city.filter(|c| is_known_city(c)),
            category: self.category.filter(|c| is_known_category(c)),
            status: self
                .status
                .as_deref()
                .and_then(ProblemStatus::parse)
                .map(|s| s.as_str().to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProblemList {
    pub count: usize,
    pub problems: Vec<Problem>,
}

/// Envelope for a single created or updated report.
#[derive(Debug, Serialize)]
pub struct ProblemResponse {
    pub message: String,
    pub problem: Problem,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}
