//! Startup seeding of the built-in admin accounts.

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::storage::models::{NewUser, User, UserType};
use crate::storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to hash seed password: {0}")]
    Hash(String),
}

struct SeedAdmin {
    username: &'static str,
    password: &'static str,
    email: &'static str,
    full_name: &'static str,
    bio: &'static str,
}

const SEED_ADMINS: &[SeedAdmin] = &[
    SeedAdmin {
        username: "admin",
        password: "admin123",
        email: "admin@hackerhire.com",
        full_name: "System Admin",
        bio: "System Administrator",
    },
    SeedAdmin {
        username: "sihab",
        password: "sihab123",
        email: "sihab@hackerhire.com",
        full_name: "Sihab Admin",
        bio: "Custom Admin",
    },
];

/// Create the built-in admins that are not present yet.
///
/// `ADMIN_PASSWORD_HASH` (or `ADMIN_PASSWORD`) replaces the password of the
/// first account. Returns the accounts created by this call.
pub async fn seed_admins(storage: &dyn Storage, config: &AppConfig) -> Result<Vec<User>, SeedError> {
    let mut created = Vec::new();

    for (index, admin) in SEED_ADMINS.iter().enumerate() {
        if storage.get_user_by_username(admin.username).await?.is_some() {
            tracing::debug!(username = admin.username, "seed admin already present");
            continue;
        }

        let password_hash = match (index, &config.admin_password_hash, &config.admin_password) {
            (0, Some(hash), _) => hash.clone(),
            (0, None, Some(plain)) => hash_with(plain.clone(), config.bcrypt_cost).await?,
            _ => hash_with(admin.password.to_string(), config.bcrypt_cost).await?,
        };

        let user = storage
            .create_user(NewUser {
                username: admin.username.to_string(),
                password_hash,
                email: admin.email.to_string(),
                user_type: UserType::Admin,
                full_name: admin.full_name.to_string(),
                company: None,
                title: Some("Administrator".to_string()),
                bio: Some(admin.bio.to_string()),
                location: None,
                profile_image: None,
                is_verified: Some(true),
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "seeded admin account");
        created.push(user);
    }

    if config.is_production() && config.admin_password_hash.is_none() && config.admin_password.is_none() {
        tracing::warn!(
            "SECURITY: seeded admin accounts use their default passwords; \
             set ADMIN_PASSWORD_HASH to a bcrypt hash of a strong password"
        );
    }

    Ok(created)
}

async fn hash_with(password: String, cost: u32) -> Result<String, SeedError> {
    hash_password(password, cost)
        .await
        .map_err(|e| SeedError::Hash(e.to_string()))
}
