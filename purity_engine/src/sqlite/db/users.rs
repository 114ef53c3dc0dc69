use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{IdentityClaims, NewUser, User},
    traits::UserStoreError,
};

pub async fn create_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserStoreError> {
    let email = user.email.trim().to_lowercase();
    let result = sqlx::query_as(
        r#"
        INSERT INTO users (email, name, password_hash, phone, city, address, email_verified, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
        RETURNING *;
        "#,
    )
    .bind(&email)
    .bind(user.name)
    .bind(user.password_hash)
    .bind(user.phone)
    .bind(user.city)
    .bind(user.address)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(UserStoreError::EmailExists(email)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = lower($1)")
        .bind(email.trim())
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

/// Inserts a verified account for the identity, or links the subject to an existing account with the same email.
/// The name and subject are refreshed from the identity on every login.
pub async fn upsert_external_identity(
    claims: &IdentityClaims,
    conn: &mut SqliteConnection,
) -> Result<User, sqlx::Error> {
    let email = claims.email.trim().to_lowercase();
    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (email, name, google_sub, email_verified, created_at)
        VALUES ($1, $2, $3, 1, $4)
        ON CONFLICT(email) DO UPDATE SET
            google_sub = excluded.google_sub,
            email_verified = 1,
            name = excluded.name
        RETURNING *;
        "#,
    )
    .bind(&email)
    .bind(&claims.name)
    .bind(&claims.subject)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    debug!("🗃️ External identity for {email} is linked to user #{}", user.id);
    Ok(user)
}

pub async fn mark_email_verified(user_id: i64, conn: &mut SqliteConnection) -> Result<(), UserStoreError> {
    let result = sqlx::query("UPDATE users SET email_verified = 1 WHERE id = $1").bind(user_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(UserStoreError::UserNotFound(user_id));
    }
    Ok(())
}

pub async fn update_password_hash(
    user_id: i64,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<(), UserStoreError> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(UserStoreError::UserNotFound(user_id));
    }
    Ok(())
}
