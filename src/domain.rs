use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::KiraError;

static ENA_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ERR\d+").expect("ENA run regex"));

/// Sample identifier, normally an ENA run accession (`ERR123456`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SampleId(String);

impl SampleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First ENA run accession found anywhere in `text`, upper-cased.
    pub fn find_accession(text: &str) -> Option<Self> {
        ENA_RUN
            .find(text)
            .map(|found| Self(found.as_str().to_uppercase()))
    }

    /// Sample id for an annotation file: the accession embedded in the name,
    /// otherwise the first dot-delimited segment.
    pub fn from_file_name(name: &str) -> Result<Self, KiraError> {
        if let Some(id) = Self::find_accession(name) {
            return Ok(id);
        }
        let stem = name.split('.').next().unwrap_or_default().trim();
        if stem.is_empty() {
            return Err(KiraError::InvalidSampleId(name.to_string()));
        }
        Ok(Self(stem.to_string()))
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SampleId {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let is_valid = normalized
            .strip_prefix("ERR")
            .map(|digits| !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid {
            return Err(KiraError::InvalidSampleId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Trimmed, lower-cased study condition. `None` when nothing is left.
pub fn normalize_group(condition: &str) -> Option<String> {
    let group = condition.trim().to_lowercase();
    if group.is_empty() { None } else { Some(group) }
}
