use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use crate::error::Result;
use crate::models::Dataset;
use crate::store::{self, DatasetStore, STORAGE_KEY};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres key-value table holding the dataset as one JSON document.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    bootstrap: PathBuf,
}

impl PgStore {
    pub fn new(pool: PgPool, bootstrap: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            bootstrap: bootstrap.into(),
        }
    }
}

#[async_trait]
impl DatasetStore for PgStore {
    async fn load(&self) -> Result<Dataset> {
        let row = sqlx::query("SELECT payload FROM student_progress.datasets WHERE key = $1")
            .bind(STORAGE_KEY)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let payload: String = row.get("payload");
            return Ok(serde_json::from_str(&payload)?);
        }

        let dataset = store::read_bootstrap(&self.bootstrap).await?;
        self.save(&dataset).await?;
        tracing::info!(bootstrap = %self.bootstrap.display(), "cached bootstrap dataset in postgres");
        Ok(dataset)
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        let payload = serde_json::to_string(dataset)?;
        sqlx::query(
            r#"
            INSERT INTO student_progress.datasets (key, payload, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(STORAGE_KEY)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        tracing::debug!(students = dataset.students.len(), "saved dataset to postgres");
        Ok(())
    }
}
