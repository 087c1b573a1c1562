use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::db_path;

pub mod entities;
pub mod models;

pub use sea_orm::{DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Opens the on-disk database, creating the file and applying pending
    /// migrations as needed.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = format!("sqlite://{}?mode=rwc", db_path().to_string_lossy());
        Self::from_url(&database_url).await
    }

    pub async fn from_url(database_url: &str) -> Result<DBService, DbErr> {
        let pool = Database::connect(database_url).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!("database ready");
        Ok(DBService { pool })
    }
}
