use super::domain::ItemId;
use super::list::PreferenceList;
use super::submission::SubmissionError;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug)]
pub enum PreferenceImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Invalid(SubmissionError),
}

impl std::fmt::Display for PreferenceImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferenceImportError::Io(err) => write!(f, "failed to read preference export: {}", err),
            PreferenceImportError::Csv(err) => write!(f, "invalid preference CSV data: {}", err),
            PreferenceImportError::Invalid(err) => {
                write!(f, "exported preferences are inconsistent: {}", err)
            }
        }
    }
}

impl std::error::Error for PreferenceImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreferenceImportError::Io(err) => Some(err),
            PreferenceImportError::Csv(err) => Some(err),
            PreferenceImportError::Invalid(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PreferenceImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for PreferenceImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<SubmissionError> for PreferenceImportError {
    fn from(err: SubmissionError) -> Self {
        Self::Invalid(err)
    }
}

#[derive(Debug, Deserialize)]
struct PreferenceRow {
    item_id: String,
    rank: u32,
}

/// Seeds a [`PreferenceList`] from a CSV export with `item_id,rank` columns.
pub struct PreferenceCsvImporter;

impl PreferenceCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        min_count: usize,
    ) -> Result<PreferenceList, PreferenceImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, min_count)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        min_count: usize,
    ) -> Result<PreferenceList, PreferenceImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in csv_reader.deserialize::<PreferenceRow>() {
            let row = row?;
            if row.item_id.is_empty() {
                continue;
            }
            records.push((ItemId(row.item_id), row.rank));
        }

        Ok(PreferenceList::with_initial(min_count, records)?)
    }
}
