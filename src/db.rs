use migration::Migrator;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;

use crate::error::AppResult;

const PRAGMAS: &[&str] =
    &["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA foreign_keys=ON"];

/// Opens a pool of exactly one connection; concurrent transactions queue on it.
pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(1).min_connections(1);
    let db = Database::connect(opt).await?;
    migrate(&db).await?;
    Ok(db)
}

pub async fn migrate(db: &DatabaseConnection) -> AppResult<()> {
    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }
    Migrator::up(db, None).await?;
    Ok(())
}

pub fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
pub async fn test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("connect in-memory sqlite");
    migrate(&db).await.expect("migrate in-memory sqlite");
    db
}

/// A migrated database in a temp file, opened the same way as in production.
/// Keep the returned dir alive for as long as the connection is used.
#[cfg(test)]
pub async fn file_db() -> (tempfile::TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("reelhouse.db").display());
    let db = connect_and_migrate(&url).await.expect("open file sqlite");
    (dir, db)
}
