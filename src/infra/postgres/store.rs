use {
    crate::domain::{
        error::ReconError,
        store::{Collection, RecordPatch, RecordStore},
    },
    sqlx::PgPool,
    std::{future::Future, pin::Pin},
};

/// Postgres-backed document store: one JSONB document per (collection, id).
/// The atomic multi-record patch is a plain transaction, so readers never
/// see half of a reconciliation batch.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RecordStore for PgStore {
    fn get<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<serde_json::Value>, ReconError>> + Send + 'a>>
    {
        Box::pin(async move {
            let doc: Option<serde_json::Value> =
                sqlx::query_scalar("SELECT doc FROM records WHERE collection = $1 AND id = $2")
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            Ok(doc)
        })
    }

    fn create<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
        doc: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<bool, ReconError>> + Send + 'a>> {
        Box::pin(async move {
            let result = sqlx::query(
                "INSERT INTO records (collection, id, doc) VALUES ($1, $2, $3) \
                 ON CONFLICT (collection, id) DO NOTHING",
            )
            .bind(collection.as_str())
            .bind(id)
            .bind(doc)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn batch_update(
        &self,
        patches: Vec<RecordPatch>,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + '_>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            for patch in &patches {
                let result = sqlx::query(
                    "UPDATE records SET doc = doc || $3, updated_at = now() \
                     WHERE collection = $1 AND id = $2",
                )
                .bind(patch.collection.as_str())
                .bind(&patch.id)
                .bind(serde_json::Value::Object(patch.fields.clone()))
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    // Dropping tx rolls back everything applied so far.
                    return Err(ReconError::NotFound(patch.collection.kind()));
                }
            }

            tx.commit().await?;
            Ok(())
        })
    }

    fn delete<'a>(
        &'a self,
        collection: Collection,
        id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReconError>> + Send + 'a>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM records WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }
}
