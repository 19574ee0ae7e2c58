pub mod blacklist_repo;
pub mod domain_repo;
pub mod host_repo;
pub mod user_repo;

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

pub type Db = SqlitePool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn init_db(path: &std::path::Path) -> anyhow::Result<Db> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
