
use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::models::{ContentKind, ContentRecord, KeywordFilters, NewContentRecord, Origin};

const RECORD_COLUMNS: &str = "id, owner_id, title, description, body, content_kind, url, domain, \
     keywords, category, origin, word_count, page_count, vector_id, is_indexed, \
     date_added, created_date";

pub struct ContentQueries;

impl ContentQueries {
    #[inline]
    pub async fn create(
        pool: &SqlitePool,
        owner_id: &str,
        new_record: NewContentRecord,
    ) -> Result<ContentRecord> {
        let now = Utc::now().naive_utc();
        let record = ContentRecord {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: new_record.title,
            description: new_record.description,
            body: new_record.body,
            content_kind: new_record.content_kind,
            url: new_record.url,
            domain: new_record.domain,
            keywords: new_record.keywords,
            category: new_record.category,
            origin: new_record.origin,
            word_count: new_record.word_count,
            page_count: new_record.page_count,
            vector_id: String::new(),
            is_indexed: false,
            date_added: new_record.date_added.unwrap_or(now),
            created_date: now,
        };

        let keywords_json = serde_json::to_string(&record.keywords)
            .context("Failed to serialize keyword list")?;

        sqlx::query(
            "INSERT INTO content (id, owner_id, title, description, body, content_kind, url, \
             domain, keywords, category, origin, word_count, page_count, vector_id, is_indexed, \
             date_added, created_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.owner_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.body)
        .bind(record.content_kind.as_str())
        .bind(&record.url)
        .bind(&record.domain)
        .bind(&keywords_json)
        .bind(&record.category)
        .bind(record.origin.as_str())
        .bind(record.word_count)
        .bind(record.page_count)
        .bind(&record.vector_id)
        .bind(record.is_indexed)
        .bind(record.date_added)
        .bind(record.created_date)
        .execute(pool)
        .await
        .context("Failed to create content record")?;

        Ok(record)
    }

    #[inline]
    pub async fn get_by_id(
        pool: &SqlitePool,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<ContentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM content WHERE id = ? AND owner_id = ?"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content record by id")?;

        row.map(|r| map_record(&r)).transpose()
    }

    /// Batch lookup by id set, scoped to the owner. Ids that resolve to no
    /// record under this owner are simply absent from the result; callers
    /// treat that as "drop the candidate".
    #[inline]
    pub async fn find_by_ids(
        pool: &SqlitePool,
        ids: &[String],
        owner_id: &str,
    ) -> Result<Vec<ContentRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let query_str = format!(
            "SELECT {RECORD_COLUMNS} FROM content \
             WHERE owner_id = ? AND id IN ({placeholders}) \
             ORDER BY date_added DESC, id ASC"
        );

        let mut query = sqlx::query(&query_str).bind(owner_id);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(pool)
            .await
            .context("Failed to fetch content records by ids")?;

        rows.iter().map(map_record).collect()
    }

    /// Case-insensitive substring match over title, description, body,
    /// keyword list, and category, scoped to the owner. Most recent records
    /// first; the position in the result defines the keyword rank.
    #[inline]
    pub async fn find_by_text_match(
        pool: &SqlitePool,
        pattern: &str,
        owner_id: &str,
        filters: &KeywordFilters,
        limit: usize,
    ) -> Result<Vec<ContentRecord>> {
        let like_pattern = format!("%{}%", escape_like(pattern));

        let mut query_str = format!(
            "SELECT {RECORD_COLUMNS} FROM content WHERE owner_id = ? AND \
             (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' \
              OR body LIKE ? ESCAPE '\\' OR keywords LIKE ? ESCAPE '\\' \
              OR category LIKE ? ESCAPE '\\')"
        );

        if filters.content_kind.is_some() {
            query_str.push_str(" AND content_kind = ?");
        }
        if filters.category.is_some() {
            query_str.push_str(" AND category = ?");
        }
        query_str.push_str(" ORDER BY date_added DESC, id ASC LIMIT ?");

        let mut query = sqlx::query(&query_str).bind(owner_id);
        for _ in 0..5 {
            query = query.bind(&like_pattern);
        }
        if let Some(kind) = filters.content_kind {
            query = query.bind(kind.as_str());
        }
        if let Some(category) = &filters.category {
            query = query.bind(category);
        }
        query = query.bind(limit as i64);

        let rows = query
            .fetch_all(pool)
            .await
            .context("Failed to run keyword match query")?;

        debug!("Keyword match for '{}' returned {} rows", pattern, rows.len());

        rows.iter().map(map_record).collect()
    }

    /// Records that have not been embedded yet, oldest first
    #[inline]
    pub async fn list_unindexed(pool: &SqlitePool) -> Result<Vec<ContentRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {RECORD_COLUMNS} FROM content WHERE is_indexed = 0 \
             ORDER BY date_added ASC, id ASC"
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list unindexed records")?;

        rows.iter().map(map_record).collect()
    }

    #[inline]
    pub async fn mark_indexed(pool: &SqlitePool, id: &str, vector_id: &str) -> Result<()> {
        sqlx::query("UPDATE content SET vector_id = ?, is_indexed = 1 WHERE id = ?")
            .bind(vector_id)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to mark record as indexed")?;

        Ok(())
    }

    /// Store model-proposed keywords and category after ingestion enrichment
    #[inline]
    pub async fn update_enrichment(
        pool: &SqlitePool,
        id: &str,
        keywords: &[String],
        category: &str,
    ) -> Result<()> {
        let keywords_json =
            serde_json::to_string(keywords).context("Failed to serialize keyword list")?;

        sqlx::query("UPDATE content SET keywords = ?, category = ? WHERE id = ?")
            .bind(&keywords_json)
            .bind(category)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to update record enrichment")?;

        Ok(())
    }

    /// Delete a record under the owner, returning it so the caller can clean
    /// up the matching vector entry
    #[inline]
    pub async fn delete(
        pool: &SqlitePool,
        id: &str,
        owner_id: &str,
    ) -> Result<Option<ContentRecord>> {
        let Some(record) = Self::get_by_id(pool, id, owner_id).await? else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM content WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await
            .context("Failed to delete content record")?;

        Ok(Some(record))
    }

    #[inline]
    pub async fn count_by_owner(pool: &SqlitePool, owner_id: &str) -> Result<(i64, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content WHERE owner_id = ?")
            .bind(owner_id)
            .fetch_one(pool)
            .await
            .context("Failed to count records")?;

        let indexed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM content WHERE owner_id = ? AND is_indexed = 1")
                .bind(owner_id)
                .fetch_one(pool)
                .await
                .context("Failed to count indexed records")?;

        Ok((total, indexed))
    }
}

/// Escape LIKE wildcards so user input is matched literally
fn escape_like(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn map_record(row: &SqliteRow) -> Result<ContentRecord> {
    let kind_str: String = row.get("content_kind");
    let origin_str: String = row.get("origin");
    let keywords_json: String = row.get("keywords");

    Ok(ContentRecord {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        body: row.get("body"),
        content_kind: ContentKind::from_str(&kind_str).map_err(|e| anyhow!(e))?,
        url: row.get("url"),
        domain: row.get("domain"),
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
        category: row.get("category"),
        origin: Origin::from_str(&origin_str).map_err(|e| anyhow!(e))?,
        word_count: row.get("word_count"),
        page_count: row.get("page_count"),
        vector_id: row.get("vector_id"),
        is_indexed: row.get("is_indexed"),
        date_added: row.get("date_added"),
        created_date: row.get("created_date"),
    })
}
