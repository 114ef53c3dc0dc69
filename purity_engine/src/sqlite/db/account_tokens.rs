use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::TokenPurpose;

pub async fn insert_token(
    user_id: i64,
    purpose: TokenPurpose,
    token: &str,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO account_tokens (user_id, purpose, token, expires_at, used) VALUES ($1, $2, $3, $4, 0)")
        .bind(user_id)
        .bind(purpose)
        .bind(token)
        .bind(expires_at)
        .execute(conn)
        .await?;
    trace!("🗃️ Issued a {purpose} token for user #{user_id}, valid until {expires_at}");
    Ok(())
}

/// Burns the token in a single statement, so a token can never be redeemed twice.
pub async fn consume_token(
    purpose: TokenPurpose,
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let user_id: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE account_tokens SET used = 1
        WHERE token = $1 AND purpose = $2 AND used = 0 AND expires_at >= $3
        RETURNING user_id;
        "#,
    )
    .bind(token)
    .bind(purpose)
    .bind(Utc::now())
    .fetch_optional(conn)
    .await?;
    Ok(user_id)
}
