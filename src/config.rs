use std::path::PathBuf;

use anyhow::{bail, Context};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    File,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub bootstrap: PathBuf,
}

impl Config {
    /// Reads `STUDENT_PROGRESS_*` and `DATABASE_URL`, honouring a `.env` file.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend = match lookup("STUDENT_PROGRESS_STORE").as_deref() {
            None | Some("file") => Backend::File,
            Some("postgres") => Backend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL must be set for the postgres store")?,
            },
            Some(other) => bail!("unknown STUDENT_PROGRESS_STORE {other:?} (expected file or postgres)"),
        };

        let data_dir = lookup("STUDENT_PROGRESS_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join("student-progress")))
            .unwrap_or_else(|| PathBuf::from(".student-progress"));
        let bootstrap = lookup("STUDENT_PROGRESS_BOOTSTRAP")
            .map_or_else(|| PathBuf::from("data.json"), PathBuf::from);

        Ok(Self {
            backend,
            data_dir,
            bootstrap,
        })
    }
}
