use std::io::Read;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{Result, TrackerError};
use crate::models::Dataset;
use crate::roster::NewStudent;

/// A serialized dataset ready to be written under `file_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("student-progress-{}.json", date.format("%Y-%m-%d"))
}

pub fn export_file(dataset: &Dataset, date: NaiveDate) -> Result<ExportFile> {
    Ok(ExportFile {
        file_name: export_file_name(date),
        bytes: serde_json::to_vec_pretty(dataset)?,
    })
}

/// Parses an exported dataset. Invariants are checked by the caller.
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset> {
    Ok(serde_json::from_slice(bytes)?)
}

#[derive(Debug, Deserialize)]
struct CsvStudent {
    name: String,
    group_id: String,
    percentage: Option<i64>,
    photo: Option<String>,
}

/// Adds one student per CSV row. Any rejected row rejects the whole file.
pub fn import_students_csv<R: Read>(dataset: &Dataset, reader: R) -> Result<(Dataset, usize)> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut next = dataset.clone();
    let mut added = 0usize;

    for (index, result) in reader.deserialize::<CsvStudent>().enumerate() {
        let row = index + 1;
        let record = result.map_err(|err| TrackerError::Csv {
            row,
            message: err.to_string(),
        })?;

        let (updated, _) = next
            .with_student_added(NewStudent {
                name: record.name,
                group_id: record.group_id,
                photo: record.photo,
                percentage: record.percentage,
            })
            .map_err(|err| TrackerError::Csv {
                row,
                message: err.to_string(),
            })?;
        next = updated;
        added += 1;
    }

    Ok((next, added))
}
