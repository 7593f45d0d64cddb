//! Submission-facing view of the field records and the consistency audit run on it.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{FieldRecord, ItemId};

pub const DEFAULT_FORM_PREFIX: &str = "form";

/// Lower and upper bounds on the number of submitted preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreferenceLimits {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// Period during which snapshots may be taken for submission.
///
/// Submissions are open strictly after `opens_at` and up to and including `closes_at`.
/// A window missing either bound is never open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubmissionWindow {
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
}

impl SubmissionWindow {
    pub fn is_set(&self) -> bool {
        self.opens_at.is_some() && self.closes_at.is_some()
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        match (self.opens_at, self.closes_at) {
            (Some(opens), Some(closes)) => now > opens && now <= closes,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("item {0} can only be chosen once")]
    DuplicateItem(ItemId),
    #[error("rank {0} is used by more than one preference")]
    DuplicateRank(u32),
    #[error("the first preference rank must be 1, found {0}")]
    FirstRankNotOne(u32),
    #[error("preference ranks must be consecutive, found {previous} followed by {next}")]
    NonConsecutiveRanks { previous: u32, next: u32 },
    #[error("please nominate at least {min} preferences")]
    TooFewRecords { min: usize },
    #[error("please nominate at most {max} preferences")]
    TooManyRecords { max: usize },
    #[error("field record {index} is missing its {field}")]
    MissingField { index: usize, field: &'static str },
    #[error("field {name} has invalid value '{value}'")]
    InvalidValue { name: String, value: String },
    #[error("preference submissions are closed")]
    WindowClosed,
}

/// Checks that items are unique and ranks form `1..=N` with no gaps or duplicates.
pub fn check_ranked<'a, I>(pairs: I) -> Result<(), SubmissionError>
where
    I: IntoIterator<Item = (&'a ItemId, u32)>,
{
    let mut items = HashSet::new();
    let mut ranks = Vec::new();
    for (item_id, rank) in pairs {
        if !items.insert(item_id) {
            return Err(SubmissionError::DuplicateItem(item_id.clone()));
        }
        if ranks.contains(&rank) {
            return Err(SubmissionError::DuplicateRank(rank));
        }
        ranks.push(rank);
    }

    ranks.sort_unstable();
    match ranks.first() {
        None => return Ok(()),
        Some(&first) if first != 1 => return Err(SubmissionError::FirstRankNotOne(first)),
        Some(_) => {}
    }
    for pair in ranks.windows(2) {
        if pair[1] != pair[0] + 1 {
            return Err(SubmissionError::NonConsecutiveRanks {
                previous: pair[0],
                next: pair[1],
            });
        }
    }
    Ok(())
}

/// The full set of field records plus management counts, as read at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSnapshot {
    pub records: Vec<FieldRecord>,
    pub total_forms: usize,
    pub initial_forms: usize,
    pub min_num_forms: usize,
    pub max_num_forms: usize,
    pub captured_at: DateTime<Utc>,
}

/// Upper bound on form records when no maximum is configured.
pub const MAX_NUM_FORMS_DEFAULT: usize = 1000;

impl SubmissionSnapshot {
    pub fn new(
        records: Vec<FieldRecord>,
        initial_forms: usize,
        limits: PreferenceLimits,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            total_forms: records.len(),
            records,
            initial_forms,
            min_num_forms: limits.min.unwrap_or(0),
            max_num_forms: limits.max.unwrap_or(MAX_NUM_FORMS_DEFAULT),
            captured_at,
        }
    }

    /// Encodes the snapshot as ordered `(name, value)` form fields.
    pub fn form_fields(&self, prefix: &str) -> Vec<(String, String)> {
        let mut fields = vec![
            (format!("{prefix}-TOTAL_FORMS"), self.total_forms.to_string()),
            (format!("{prefix}-INITIAL_FORMS"), self.initial_forms.to_string()),
            (format!("{prefix}-MIN_NUM_FORMS"), self.min_num_forms.to_string()),
            (format!("{prefix}-MAX_NUM_FORMS"), self.max_num_forms.to_string()),
        ];
        for record in &self.records {
            let index = record.index;
            fields.push((
                format!("{prefix}-{index}-item_id"),
                record
                    .item_id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ));
            fields.push((
                format!("{prefix}-{index}-rank"),
                record.rank.map(|rank| rank.to_string()).unwrap_or_default(),
            ));
        }
        fields
    }

    /// Decodes fields produced by [`SubmissionSnapshot::form_fields`].
    pub fn from_form_fields<I, K, V>(
        prefix: &str,
        fields: I,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, SubmissionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut management: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut records: BTreeMap<usize, FieldRecord> = BTreeMap::new();

        for (name, value) in fields {
            let name = name.as_ref();
            let value = value.as_ref().trim();
            let Some(rest) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('-'))
            else {
                continue;
            };

            if let Some(key) = management_key(rest) {
                management.insert(key, parse_number(name, value)?);
                continue;
            }

            let Some((index, field)) = rest.split_once('-') else {
                return Err(invalid(name, value));
            };
            let index: usize = index.parse().map_err(|_| invalid(name, value))?;
            let record = records
                .entry(index)
                .or_insert_with(|| FieldRecord::empty(index));
            match field {
                "item_id" if !value.is_empty() => record.item_id = Some(ItemId::new(value)),
                "item_id" => {}
                "rank" if !value.is_empty() => record.rank = Some(parse_number(name, value)?),
                "rank" => {}
                _ => return Err(invalid(name, value)),
            }
        }

        let total_forms = management
            .get("TOTAL_FORMS")
            .copied()
            .ok_or(SubmissionError::MissingField {
                index: 0,
                field: "TOTAL_FORMS",
            })?;
        let records: Vec<FieldRecord> = records.into_values().take(total_forms).collect();
        if records.len() != total_forms {
            return Err(SubmissionError::MissingField {
                index: records.len(),
                field: "item_id",
            });
        }

        Ok(Self {
            records,
            total_forms,
            initial_forms: management.get("INITIAL_FORMS").copied().unwrap_or(0),
            min_num_forms: management.get("MIN_NUM_FORMS").copied().unwrap_or(0),
            max_num_forms: management
                .get("MAX_NUM_FORMS")
                .copied()
                .unwrap_or(MAX_NUM_FORMS_DEFAULT),
            captured_at,
        })
    }

    /// Audits the records: counts within limits, every record filled, items unique,
    /// ranks contiguous from 1, positional index equal to `rank - 1`.
    pub fn validate(&self, limits: PreferenceLimits) -> Result<(), SubmissionError> {
        if let Some(min) = limits.min {
            if self.records.len() < min {
                return Err(SubmissionError::TooFewRecords { min });
            }
        }
        if let Some(max) = limits.max {
            if self.records.len() > max {
                return Err(SubmissionError::TooManyRecords { max });
            }
        }

        let mut pairs = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let item_id = record.item_id.as_ref().ok_or(SubmissionError::MissingField {
                index: record.index,
                field: "item_id",
            })?;
            let rank = record.rank.ok_or(SubmissionError::MissingField {
                index: record.index,
                field: "rank",
            })?;
            pairs.push((item_id, rank));
        }
        check_ranked(pairs.iter().copied())?;

        if let Some(record) = self
            .records
            .iter()
            .find(|record| record.rank.map(|rank| rank as usize) != Some(record.index + 1))
        {
            return Err(SubmissionError::InvalidValue {
                name: format!("{DEFAULT_FORM_PREFIX}-{}-rank", record.index),
                value: record.rank.map(|rank| rank.to_string()).unwrap_or_default(),
            });
        }
        Ok(())
    }
}

fn management_key(rest: &str) -> Option<&'static str> {
    match rest {
        "TOTAL_FORMS" => Some("TOTAL_FORMS"),
        "INITIAL_FORMS" => Some("INITIAL_FORMS"),
        "MIN_NUM_FORMS" => Some("MIN_NUM_FORMS"),
        "MAX_NUM_FORMS" => Some("MAX_NUM_FORMS"),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SubmissionError> {
    value.parse().map_err(|_| invalid(name, value))
}

fn invalid(name: &str, value: &str) -> SubmissionError {
    SubmissionError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    }
}
