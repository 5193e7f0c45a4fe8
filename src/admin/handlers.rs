use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{extractors::AdminUser, scope::AdminScope},
    error::ApiError,
    problems::{
        dto::{ProblemList, ProblemQuery},
        repo::{self as problems_repo, Problem},
    },
    state::AppState,
};

use super::dto::{CategoryStats, CityStats, StatsResponse, TotalStats, UserList};
use super::repo;

const RECENT_LIMIT: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/problems", get(list_problems))
        .route("/admin/stats", get(stats))
        .route("/admin/users", get(list_users))
}

/// Admin problem listing: the caller's filters apply first, then scope
/// filtering removes anything outside the admin's cities/categories. Rows
/// outside scope are dropped, never surfaced.
#[instrument(skip(state, admin))]
pub async fn list_problems(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Query(query): Query<ProblemQuery>,
) -> Result<Json<ProblemList>, ApiError> {
    let scope = admin.scope();
    let mut problems = problems_repo::list(&state.db, &query.into_filters()).await?;
    if !scope.is_unrestricted() {
        problems.retain(|p| scope.allows(&p.city, &p.category));
    }
    Ok(Json(ProblemList {
        count: problems.len(),
        problems,
    }))
}

#[instrument(skip(state, admin))]
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<StatsResponse>, ApiError> {
    let scope = admin.scope();

    if scope.is_unrestricted() {
        let city_stats = repo::city_stats(&state.db).await?;
        let category_stats = repo::category_stats(&state.db).await?;
        let total_stats = repo::total_stats(&state.db).await?;
        let recent_problems = problems_repo::recent(&state.db, RECENT_LIMIT as i64).await?;
        return Ok(Json(StatsResponse {
            city_stats,
            category_stats,
            recent_problems,
            total_stats,
        }));
    }

    // Scoped admins get aggregates computed over their visible rows only,
    // so a per-category count can never include another city's reports.
    let mut rows = problems_repo::list(&state.db, &Default::default()).await?;
    rows.retain(|p| scope.allows(&p.city, &p.category));

    let (city_stats, category_stats, total_stats) = aggregate_stats(&rows);
    let recent_problems = rows.into_iter().take(RECENT_LIMIT).collect();

    Ok(Json(StatsResponse {
        city_stats,
        category_stats,
        recent_problems,
        total_stats,
    }))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<UserList>, ApiError> {
    let users = repo::list_users(&state.db).await?;
    Ok(Json(UserList { users }))
}

/// In-memory counterpart of the SQL aggregates, applied to an
/// already-scope-filtered row set. Input is expected newest-first.
fn aggregate_stats(rows: &[Problem]) -> (Vec<CityStats>, Vec<CategoryStats>, TotalStats) {
    let mut by_city: BTreeMap<&str, CityStats> = BTreeMap::new();
    let mut by_category: BTreeMap<&str, i64> = BTreeMap::new();
    let mut reporters: Vec<uuid::Uuid> = Vec::new();
    let mut resolved = 0i64;

    for p in rows {
        let entry = by_city.entry(&p.city).or_insert_with(|| CityStats {
            city: p.city.clone(),
            count: 0,
            reported: 0,
            in_progress: 0,
            resolved: 0,
        });
        entry.count += 1;
        match p.status.as_str() {
            "reported" => entry.reported += 1,
            "in_progress" => entry.in_progress += 1,
            "resolved" => entry.resolved += 1,
            _ => {}
        }

        *by_category.entry(&p.category).or_default() += 1;

        if p.status == "resolved" {
            resolved += 1;
        }
        if let Some(user_id) = p.user_id {
            if !reporters.contains(&user_id) {
                reporters.push(user_id);
            }
        }
    }

    let city_stats = by_city.into_values().collect();
    let mut category_stats: Vec<CategoryStats> = by_category
        .into_iter()
        .map(|(category, count)| CategoryStats {
            category: category.to_string(),
            count,
        })
        .collect();
    category_stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    let total_stats = TotalStats {
        total_problems: rows.len() as i64,
        total_reporters: reporters.len() as i64,
        resolved_problems: resolved,
    };
    (city_stats, category_stats, total_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::scope::Permissions;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn problem(city: &str, category: &str, status: &str, user: Option<Uuid>) -> Problem {
        Problem {
            id: Uuid::new_v4(),
            title: "A problem title".into(),
            description: "A long enough description".into(),
            category: category.into(),
            city: city.into(),
            latitude: -19.1,
            longitude: 33.48,
            status: status.into(),
            user_id: user,
            image_url: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            updated_by: None,
            user_name: "Ana".into(),
        }
    }

    #[test]
    fn aggregates_count_per_city_and_status() {
        let reporter = Uuid::new_v4();
        let rows = vec![
            problem("Chimoio", "Buraco na Rua", "reported", Some(reporter)),
            problem("Chimoio", "Outros", "resolved", Some(reporter)),
            problem("Beira", "Buraco na Rua", "in_progress", Some(Uuid::new_v4())),
        ];
        let (cities, categories, totals) = aggregate_stats(&rows);

        assert_eq!(cities.len(), 2);
        let chimoio = cities.iter().find(|c| c.city == "Chimoio").unwrap();
        assert_eq!(chimoio.count, 2);
        assert_eq!(chimoio.reported, 1);
        assert_eq!(chimoio.resolved, 1);
        assert_eq!(chimoio.in_progress, 0);

        assert_eq!(categories[0].category, "Buraco na Rua");
        assert_eq!(categories[0].count, 2);

        assert_eq!(totals.total_problems, 3);
        assert_eq!(totals.total_reporters, 2);
        assert_eq!(totals.resolved_problems, 1);
    }

    #[test]
    fn scoped_rows_never_include_foreign_city() {
        let scope = AdminScope::Limited(Permissions {
            cities: vec!["Chimoio".into()],
            categories: vec!["all".into()],
        });
        let mut rows = vec![
            problem("Chimoio", "Outros", "reported", None),
            problem("Beira", "Outros", "reported", None),
        ];
        rows.retain(|p| scope.allows(&p.city, &p.category));
        let (cities, _, totals) = aggregate_stats(&rows);
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].city, "Chimoio");
        assert_eq!(totals.total_problems, 1);
    }

    #[test]
    fn empty_scope_produces_empty_stats() {
        let (cities, categories, totals) = aggregate_stats(&[]);
        assert!(cities.is_empty());
        assert!(categories.is_empty());
        assert_eq!(totals.total_problems, 0);
        assert_eq!(totals.total_reporters, 0);
    }
}
