use anyhow::{bail, Result};
use chrono::Utc;
use model::entities::user;
use sea_orm::{ColumnTrait, Condition, Database, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::config::AppConfig;
use crate::repository::Repository;

pub async fn create_superuser(
    database_url: Option<&str>,
    email: &str,
    username: &str,
    password: &str,
) -> Result<()> {
    trace!("Entering create_superuser function");
    info!("Creating superuser {}", username);

    if username.is_empty() || username.len() > 20 {
        bail!("username must be between 1 and 20 characters");
    }
    if !email.contains('@') {
        bail!("email address is not valid");
    }
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let mut config = AppConfig::from_env();
    if let Some(url) = database_url {
        config.database.url = url.to_string();
    }
    debug!("Database URL: {}", config.database.url);

    let db = Database::connect(&config.database.url).await?;

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(email))
                .add(user::Column::Username.eq(username)),
        )
        .one(&db)
        .await?;
    if existing.is_some() {
        warn!("A user with this email or username already exists");
        bail!("a user with this email or username already exists");
    }

    let hashed = hash_password(password)
        .map_err(|hash_error| anyhow::anyhow!("password hashing failed: {}", hash_error))?;

    let now = Utc::now().fixed_offset();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        username: Set(username.to_string()),
        hashed_password: Set(hashed),
        is_active: Set(true),
        is_superuser: Set(true),
        is_verified: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = Repository::<user::Entity>::insert(&db, new_user).await?;
    info!(
        "Superuser created with ID: {}, username: {}",
        created.id, created.username
    );
    Ok(())
}
