use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{ContentRecord, KeywordFilters, NewContentRecord};
use crate::database::sqlite::queries::ContentQueries;


pub mod models;
pub mod queries;

pub type DbPool = Pool<Sqlite>;

/// Handle to the Document Store, the system of record for content.
/// Cloning shares the underlying pool, which is safe for concurrent use by
/// many simultaneous requests.
#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    #[inline]
    pub async fn create_record(
        &self,
        owner_id: &str,
        new_record: NewContentRecord,
    ) -> Result<ContentRecord> {
        ContentQueries::create(&self.pool, owner_id, new_record).await
    }

    #[inline]
    pub async fn get_record(&self, id: &str, owner_id: &str) -> Result<Option<ContentRecord>> {
        ContentQueries::get_by_id(&self.pool, id, owner_id).await
    }

    #[inline]
    pub async fn find_by_ids(&self, ids: &[String], owner_id: &str) -> Result<Vec<ContentRecord>> {
        ContentQueries::find_by_ids(&self.pool, ids, owner_id).await
    }

    #[inline]
    pub async fn find_by_text_match(
        &self,
        pattern: &str,
        owner_id: &str,
        filters: &KeywordFilters,
        limit: usize,
    ) -> Result<Vec<ContentRecord>> {
        ContentQueries::find_by_text_match(&self.pool, pattern, owner_id, filters, limit).await
    }

    #[inline]
    pub async fn list_unindexed(&self) -> Result<Vec<ContentRecord>> {
        ContentQueries::list_unindexed(&self.pool).await
    }

    #[inline]
    pub async fn mark_indexed(&self, id: &str, vector_id: &str) -> Result<()> {
        ContentQueries::mark_indexed(&self.pool, id, vector_id).await
    }

    #[inline]
    pub async fn update_enrichment(
        &self,
        id: &str,
        keywords: &[String],
        category: &str,
    ) -> Result<()> {
        ContentQueries::update_enrichment(&self.pool, id, keywords, category).await
    }

    #[inline]
    pub async fn delete_record(&self, id: &str, owner_id: &str) -> Result<Option<ContentRecord>> {
        ContentQueries::delete(&self.pool, id, owner_id).await
    }

    #[inline]
    pub async fn count_by_owner(&self, owner_id: &str) -> Result<(i64, i64)> {
        ContentQueries::count_by_owner(&self.pool, owner_id).await
    }
}
