use async_trait::async_trait;
use govdesk_engine::{CatalogService, CollaboratorError, ServiceCatalog};
use sqlx::PgPool;

/// Active services straight from the directory's `services` table.
pub struct PgServiceCatalog {
    db: PgPool,
}

impl PgServiceCatalog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    canonical_name: String,
    embedding: Option<serde_json::Value>,
}

/// A stored embedding is a JSON array of numbers. Anything else counts as
/// missing and is embedded on demand.
fn parse_embedding(value: Option<&serde_json::Value>) -> Option<Vec<f64>> {
    let items = value?.as_array()?;
    let out: Option<Vec<f64>> = items.iter().map(serde_json::Value::as_f64).collect();
    out.filter(|embedding| !embedding.is_empty())
}

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    async fn active_services(&self) -> Result<Vec<CatalogService>, CollaboratorError> {
        let rows = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, canonical_name, embedding
            FROM services
            WHERE is_active
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|err| CollaboratorError::Catalog(err.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| CatalogService {
                embedding: parse_embedding(row.embedding.as_ref()),
                id: row.id,
                canonical_name: row.canonical_name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn only_numeric_arrays_are_embeddings() {
        assert_eq!(parse_embedding(Some(&json!([0.5, 1, -0.25]))), Some(vec![0.5, 1.0, -0.25]));
        assert_eq!(parse_embedding(Some(&json!([]))), None);
        assert_eq!(parse_embedding(Some(&json!([0.5, "x"]))), None);
        assert_eq!(parse_embedding(Some(&json!({"v": [1.0]}))), None);
        assert_eq!(parse_embedding(None), None);
    }
}
