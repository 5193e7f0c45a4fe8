use sqlx::PgPool;

use super::dto::{CategoryStats, CityStats, TotalStats, UserSummary};

pub async fn city_stats(db: &PgPool) -> anyhow::Result<Vec<CityStats>> {
    let rows = sqlx::query_as::<_, CityStats>(
        r#"
        SELECT city,
               COUNT(*) AS count,
               SUM(CASE WHEN status = 'reported' THEN 1 ELSE 0 END) AS reported,
               SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END) AS in_progress,
               SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END) AS resolved
        FROM problems
        GROUP BY city
        ORDER BY city
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn category_stats(db: &PgPool) -> anyhow::Result<Vec<CategoryStats>> {
    let rows = sqlx::query_as::<_, CategoryStats>(
        r#"
        SELECT category, COUNT(*) AS count
        FROM problems
        GROUP BY category
        ORDER BY count DESC, category
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn total_stats(db: &PgPool) -> anyhow::Result<TotalStats> {
    let totals = sqlx::query_as::<_, TotalStats>(
        r#"
        SELECT COUNT(*) AS total_problems,
               COUNT(DISTINCT user_id) AS total_reporters,
               COALESCE(SUM(CASE WHEN status = 'resolved' THEN 1 ELSE 0 END), 0) AS resolved_problems
        FROM problems
        "#,
    )
    .fetch_one(db)
    .await?;
    Ok(totals)
}

pub async fn list_users(db: &PgPool) -> anyhow::Result<Vec<UserSummary>> {
    let rows = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, name, email, role, created_at
        FROM users
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}
