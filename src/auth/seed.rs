use anyhow::Context;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::auth::{
    password::{hash_password, validate_password},
    repo::{User, ROLE_ADMIN},
    scope::Permissions,
};
use crate::problems::validate::sanitize_text;

/// One admin account from the seed file. Passwords are policy-checked and
/// hashed through the same path as self-registration.
#[derive(Debug, Deserialize)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
    pub admin_group: String,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// First-run admin provisioning. Entries whose email already exists are
/// skipped, so re-running at every startup is safe.
pub async fn seed_admins(db: &PgPool, path: &str) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("read admin seed file {path}"))?;
    let seeds: Vec<AdminSeed> = serde_json::from_str(&raw).context("parse admin seed file")?;

    for seed in seeds {
        let email = seed.email.trim().to_lowercase();
        if User::find_by_email(db, &email).await?.is_some() {
            debug!(email = %email, "seed admin already present");
            continue;
        }

        validate_password(&seed.password)
            .map_err(|reason| anyhow::anyhow!("seed admin {email}: {reason}"))?;
        let password = seed.password.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("join hash task")??;

        let permissions = Permissions {
            cities: seed.cities,
            categories: seed.categories,
        };
        let name = sanitize_text(seed.name.trim());
        let user = User::create(
            db,
            &name,
            &email,
            &hash,
            ROLE_ADMIN,
            Some(&seed.admin_group),
            Some(&permissions),
        )
        .await
        .with_context(|| format!("create seed admin {email}"))?;

        info!(
            user_id = %user.id,
            email = %user.email,
            group = %seed.admin_group,
            "seeded admin account"
        );
    }
    Ok(())
}
