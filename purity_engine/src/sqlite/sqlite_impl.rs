//! `SqliteDatabase` is the concrete storage backend of the storefront.
//!
//! It uses SQLite and implements all the traits defined in the [`traits`](crate::traits) module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{account_tokens, db_url, new_pool, orders, users};
use crate::{
    db_types::{IdentityClaims, NewOrder, NewUser, Order, PaymentApplication, PaymentResult, TokenPurpose, User},
    traits::{OrderManagement, OrderStoreError, UserManagement, UserStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        debug!("🗃️ Order #{} ({}) has been saved with status {}", order.id, order.order_no, order.status);
        Ok(order)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_gateway_ref(&self, gateway_order_id: &str) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_gateway_ref(gateway_order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn cancel_order(&self, id: i64, user_id: i64) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let cancelled = orders::cancel_order(id, user_id, &mut conn).await?;
        Ok(cancelled)
    }

    async fn apply_payment_result(&self, result: PaymentResult) -> Result<PaymentApplication, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::apply_payment_result(result, &mut conn).await
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::create_user(user, &mut conn).await?;
        debug!("🗃️ Created user #{} for {}", user.id, user.email);
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(id, &mut conn).await?;
        Ok(user)
    }

    async fn upsert_external_identity(&self, claims: &IdentityClaims) -> Result<User, UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::upsert_external_identity(claims, &mut conn).await?;
        Ok(user)
    }

    async fn mark_email_verified(&self, user_id: i64) -> Result<(), UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::mark_email_verified(user_id, &mut conn).await
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> Result<(), UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        users::update_password_hash(user_id, password_hash, &mut conn).await
    }

    async fn insert_account_token(
        &self,
        user_id: i64,
        purpose: TokenPurpose,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        account_tokens::insert_token(user_id, purpose, token, expires_at, &mut conn).await?;
        Ok(())
    }

    async fn consume_account_token(&self, purpose: TokenPurpose, token: &str) -> Result<Option<i64>, UserStoreError> {
        let mut conn = self.pool.acquire().await?;
        let user_id = account_tokens::consume_token(purpose, token, &mut conn).await?;
        Ok(user_id)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `TP_DATABASE_URL` or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }
}
