use log::*;
use tempfile::TempDir;

use crate::{db_types::NewUser, traits::UserManagement, SqliteDatabase};

/// Loads `.env.test`, initialises logging and returns a freshly migrated database at `url`.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    db
}

/// A URL for a database file inside `dir`. The file is created on first connection.
pub fn db_url_in(dir: &std::path::Path) -> String {
    format!("sqlite://{}/test_store_{}.db", dir.display(), rand::random::<u64>())
}

/// A migrated database in a temporary directory. The directory, and the database with it, is removed on drop.
pub struct TestDb {
    pub db: SqliteDatabase,
    _dir: TempDir,
}

pub async fn temporary_test_env() -> TestDb {
    let dir = tempfile::tempdir().expect("Error creating temp dir");
    let db = prepare_test_env(&db_url_in(dir.path())).await;
    TestDb { db, _dir: dir }
}

/// Creates a customer account and returns its id.
pub async fn create_customer(db: &SqliteDatabase, email: &str) -> i64 {
    let user = NewUser { email: email.into(), name: "Test Customer".into(), ..Default::default() };
    db.create_user(user).await.expect("Error creating customer").id
}
