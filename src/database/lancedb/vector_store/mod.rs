#[cfg(test)]
mod tests;

use super::{VectorEntry, VectorHit, VectorIndex, VectorMetadata};
use crate::config::Config;
use crate::{RecallError, Result};
use arrow::array::{Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "entries";

/// Vector store backed by LanceDB. The connection handle is cheap to clone
/// and safe to share across concurrent requests; the vector dimension is
/// fixed at construction from the configured embedding model.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    dimension: usize,
}

impl VectorStore {
    #[inline]
    pub async fn new(config: &Config) -> Result<Self> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RecallError::Database(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RecallError::Unavailable(format!("Failed to connect to LanceDB: {}", e)))?;

        let store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            dimension: config.ollama.embedding_dimension as usize,
        };

        store.initialize_table().await?;

        info!("Vector store initialized successfully");
        Ok(store)
    }

    /// Create the entries table if missing; recreate it when the stored
    /// vector dimension no longer matches the configured embedding model
    /// (existing entries then need a re-index)
    async fn initialize_table(&self) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            match self.detect_existing_dimension().await {
                Ok(dim) if dim == self.dimension => {
                    debug!("Entries table exists with {} dimensions", dim);
                    return Ok(());
                }
                Ok(dim) => {
                    warn!(
                        "Vector dimension changed from {} to {}, recreating table; existing \
                         entries require re-indexing",
                        dim, self.dimension
                    );
                    self.connection
                        .drop_table(&self.table_name)
                        .await
                        .map_err(|e| {
                            RecallError::Database(format!("Failed to drop stale table: {}", e))
                        })?;
                }
                Err(e) => {
                    warn!("Could not detect vector dimension from existing table: {}", e);
                    return Ok(());
                }
            }
        }

        info!(
            "Creating entries table with {} dimensions",
            self.dimension
        );

        let schema = self.create_schema();
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to create table: {}", e)))?;

        Ok(())
    }

    async fn detect_existing_dimension(&self) -> Result<usize> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to open existing table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RecallError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("title", DataType::Utf8, false),
            Field::new("description", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("content_kind", DataType::Utf8, false),
            Field::new("category", DataType::Utf8, false),
            Field::new("date_added", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
        ]))
    }

    /// Whether the entries table is present and openable
    #[inline]
    pub async fn is_ready(&self) -> bool {
        match self.connection.table_names().execute().await {
            Ok(names) => names.contains(&self.table_name),
            Err(e) => {
                warn!("Vector store readiness check failed: {}", e);
                false
            }
        }
    }

    fn create_record_batch(&self, entry: &VectorEntry) -> Result<RecordBatch> {
        if entry.vector.len() != self.dimension {
            return Err(RecallError::Database(format!(
                "Vector dimension mismatch: entry has {}, table expects {}",
                entry.vector.len(),
                self.dimension
            )));
        }

        let schema = self.create_schema();

        let values_array = Float32Array::from(entry.vector.clone());
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            field,
            self.dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| RecallError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec![entry.id.as_str()])),
            Arc::new(vector_array),
            Arc::new(StringArray::from(vec![entry.metadata.title.as_str()])),
            Arc::new(StringArray::from(vec![entry.metadata.description.as_str()])),
            Arc::new(StringArray::from(vec![entry.metadata.url.as_str()])),
            Arc::new(StringArray::from(vec![entry.metadata.content_kind.as_str()])),
            Arc::new(StringArray::from(vec![entry.metadata.category.as_str()])),
            Arc::new(StringArray::from(vec![entry.metadata.date_added.as_str()])),
            Arc::new(StringArray::from(vec![entry.text.as_str()])),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| RecallError::Database(format!("Failed to create record batch: {}", e)))
    }

    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<VectorHit>> {
        let mut hits = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to read result stream: {}", e)))?
        {
            hits.extend(parse_search_batch(&batch)?);
        }

        debug!("Parsed {} search results from stream", hits.len());
        Ok(hits)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RecallError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RecallError::Database(format!("Invalid {} column type", name)))
}

fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<VectorHit>> {
    let ids = string_column(batch, "id")?;
    let titles = string_column(batch, "title")?;
    let descriptions = string_column(batch, "description")?;
    let urls = string_column(batch, "url")?;
    let content_kinds = string_column(batch, "content_kind")?;
    let categories = string_column(batch, "category")?;
    let date_addeds = string_column(batch, "date_added")?;
    let texts = string_column(batch, "text")?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    let mut hits = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        hits.push(VectorHit {
            id: ids.value(row).to_string(),
            distance,
            similarity: 1.0 - distance,
            metadata: VectorMetadata {
                title: titles.value(row).to_string(),
                description: descriptions.value(row).to_string(),
                url: urls.value(row).to_string(),
                content_kind: content_kinds.value(row).to_string(),
                category: categories.value(row).to_string(),
                date_added: date_addeds.value(row).to_string(),
            },
            text: texts.value(row).to_string(),
        });
    }

    Ok(hits)
}

/// Quote a string for use in a LanceDB filter predicate
fn quote_predicate_value(value: &str) -> String {
    value.replace('\'', "''")
}

#[async_trait]
impl VectorIndex for VectorStore {
    #[inline]
    async fn upsert(&self, entry: VectorEntry) -> Result<()> {
        debug!("Upserting vector entry {}", entry.id);

        let record_batch = self.create_record_batch(&entry)?;

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to open table: {}", e)))?;

        // Replace, never mutate in place
        let predicate = format!("id = '{}'", quote_predicate_value(&entry.id));
        table
            .delete(&predicate)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to delete prior entry: {}", e)))?;

        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to insert entry: {}", e)))?;

        Ok(())
    }

    #[inline]
    async fn query(&self, vector: &[f32], limit: usize) -> Result<Vec<VectorHit>> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to open table: {}", e)))?;

        let query = table
            .vector_search(vector)
            .map_err(|e| RecallError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let results = query
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    #[inline]
    async fn delete(&self, id: &str) -> Result<()> {
        debug!("Deleting vector entry {}", id);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to open table: {}", e)))?;

        let predicate = format!("id = '{}'", quote_predicate_value(id));
        table
            .delete(&predicate)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to delete entry: {}", e)))?;

        Ok(())
    }

    #[inline]
    async fn count(&self) -> Result<u64> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RecallError::Database(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RecallError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}
