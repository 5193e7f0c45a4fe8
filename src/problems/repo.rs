use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Report lifecycle. Any of the three states is reachable from any other;
/// the only fixed point is that new reports start as `reported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    Reported,
    InProgress,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Reported => "reported",
            ProblemStatus::InProgress => "in_progress",
            ProblemStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reported" => Some(ProblemStatus::Reported),
            "in_progress" => Some(ProblemStatus::InProgress),
            "resolved" => Some(ProblemStatus::Resolved),
            _ => None,
        }
    }
}

const PROBLEM_COLUMNS: &str = r#"
    p.id, p.title, p.description, p.category, p.city,
    p.latitude, p.longitude, p.status, p.user_id, p.image_url,
    p.created_at, p.updated_at, p.updated_by,
    COALESCE(u.name, 'Anonymous') AS user_name
"#;

/// Problem report joined with the reporter's display name. The user
/// reference is weak: a missing reporter renders as `Anonymous`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Problem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
    pub user_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub updated_by: Option<Uuid>,
    pub user_name: String,
}

/// Validated, already-sanitized fields for a new report.
#[derive(Debug, Clone)]
pub struct NewProblem {
    pub title: String,
    pub description: String,
    pub category: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Conjunctive optional filters; `None` means "no filter".
#[derive(Debug, Clone, Default)]
pub struct ProblemFilters {
    pub city: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub async fn list(db: &PgPool, filters: &ProblemFilters) -> anyhow::Result<Vec<Problem>> {
    let rows = sqlx::query_as::<_, Problem>(&format!(
        r#"
        SELECT {PROBLEM_COLUMNS}
        FROM problems p
        LEFT JOIN users u ON p.user_id = u.id
        WHERE ($1::text IS NULL OR p.city = $1)
          AND ($2::text IS NULL OR p.category = $2)
          AND ($3::text IS NULL OR p.status = $3)
        ORDER BY p.created_at DESC
        "#
    ))
    .bind(filters.city.as_deref())
    .bind(filters.category.as_deref())
    .bind(filters.status.as_deref())
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recent(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Problem>> {
    let rows = sqlx::query_as::<_, Problem>(&format!(
        r#"
        SELECT {PROBLEM_COLUMNS}
        FROM problems p
        LEFT JOIN users u ON p.user_id = u.id
        ORDER BY p.created_at DESC
        LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Problem>> {
    let row = sqlx::query_as::<_, Problem>(&format!(
        r#"
        SELECT {PROBLEM_COLUMNS}
        FROM problems p
        LEFT JOIN users u ON p.user_id = u.id
        WHERE p.id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create(
    db: &PgPool,
    input: &NewProblem,
    owner_id: Uuid,
    image_url: Option<&str>,
) -> anyhow::Result<Problem> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO problems
            (title, description, category, city, latitude, longitude, status, user_id, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.category)
    .bind(&input.city)
    .bind(input.latitude)
    .bind(input.longitude)
    .bind(ProblemStatus::Reported.as_str())
    .bind(owner_id)
    .bind(image_url)
    .fetch_one(db)
    .await?;

    find_by_id(db, id)
        .await?
        .context("created problem not found")
}

/// Set a new status, stamping when and by whom. Returns `None` when the
/// report does not exist.
pub async fn update_status(
    db: &PgPool,
    id: Uuid,
    status: ProblemStatus,
    admin_id: Uuid,
) -> anyhow::Result<Option<Problem>> {
    let result = sqlx::query(
        r#"
        UPDATE problems
        SET status = $2, updated_at = now(), updated_by = $3
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .bind(admin_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ProblemStatus::Reported,
            ProblemStatus::InProgress,
            ProblemStatus::Resolved,
        ] {
            assert_eq!(ProblemStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ProblemStatus::parse("fixed"), None);
        assert_eq!(ProblemStatus::parse("Resolved"), None);
    }

    #[test]
    fn status_serde_matches_wire_names() {
        assert_eq!(
            serde_json::to_string(&ProblemStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        let parsed: ProblemStatus = serde_json::from_str("\"resolved\"").unwrap();
        assert_eq!(parsed, ProblemStatus::Resolved);
    }
}
