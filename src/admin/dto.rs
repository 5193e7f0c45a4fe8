use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::problems::repo::Problem;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CityStats {
    pub city: String,
    pub count: i64,
    pub reported: i64,
    pub in_progress: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryStats {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TotalStats {
    pub total_problems: i64,
    pub total_reporters: i64,
    pub resolved_problems: i64,
}

/// Dashboard aggregates, restricted to the requesting admin's scope.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub city_stats: Vec<CityStats>,
    pub category_stats: Vec<CategoryStats>,
    pub recent_problems: Vec<Problem>,
    pub total_stats: TotalStats,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserSummary>,
}
