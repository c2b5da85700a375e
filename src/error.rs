use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("dataset integrity violated: {}", summarize(.0))]
    Integrity(Vec<Violation>),

    #[error("failed to {action} {}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("no saved dataset and no bootstrap dataset at {}", .0.display())]
    NoDataset(PathBuf),

    #[error("malformed dataset JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("malformed CSV at row {row}: {message}")]
    Csv { row: usize, message: String },
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn student_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "student",
            id: id.to_string(),
        }
    }

    pub fn group_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "group",
            id: id.to_string(),
        }
    }

    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// True for storage failures after which the in-memory dataset stays authoritative.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Database(_) | Self::NoDataset(_)
        )
    }
}

/// One broken dataset invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("group id {0} is used more than once")]
    DuplicateGroup(String),

    #[error("student id {0} is used more than once")]
    DuplicateStudent(String),

    #[error("student {0} has an empty name")]
    EmptyName(String),

    #[error("student {id} has percentage {percentage} outside 0..=100")]
    PercentageOutOfRange { id: String, percentage: i32 },

    #[error("student {student} belongs to missing group {group}")]
    OrphanedStudent { student: String, group: String },

    #[error("group {group} names missing representative {student}")]
    MissingRepresentative { group: String, student: String },

    #[error("group {group} names representative {student} from another group")]
    ForeignRepresentative { group: String, student: String },

    #[error("star thresholds are empty")]
    NoThresholds,

    #[error("star thresholds are not ascending")]
    UnorderedThresholds,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
