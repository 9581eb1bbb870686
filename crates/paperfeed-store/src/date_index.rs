//! Date index over archived snapshots.
//!
//! Archives are addressed purely by file name (`YYYY-MM-DD_output.json`).
//! Anything in the cache directory that does not follow that pattern is
//! ignored rather than reported.

use chrono::NaiveDate;
use serde::Serialize;

/// Calendar format used in archive names and the `?date=` parameter.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Human-readable form shown in the UI, e.g. "January 05, 2024".
pub const DISPLAY_FORMAT: &str = "%B %d, %Y";
/// Suffix shared by every archive file.
pub const ARCHIVE_SUFFIX: &str = "_output.json";

/// One archived date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateEntry {
    pub date: NaiveDate,
    /// `YYYY-MM-DD`
    pub key: String,
    pub display: String,
}

impl DateEntry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            key: date.format(DATE_FORMAT).to_string(),
            display: display_date(date),
        }
    }
}

/// Archived dates, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateIndex {
    entries: Vec<DateEntry>,
}

impl DateIndex {
    /// Build the index from directory entry names.
    pub fn from_file_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dates: Vec<NaiveDate> = names
            .into_iter()
            .filter_map(|name| date_from_file_name(name.as_ref()))
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();

        Self { entries: dates.into_iter().map(DateEntry::new).collect() }
    }

    pub fn entries(&self) -> &[DateEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DateEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.date == date)
    }

    pub fn latest(&self) -> Option<&DateEntry> {
        self.entries.first()
    }
}

impl IntoIterator for DateIndex {
    type Item = DateEntry;
    type IntoIter = std::vec::IntoIter<DateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a DateIndex {
    type Item = &'a DateEntry;
    type IntoIter = std::slice::Iter<'a, DateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// `2024-01-05_output.json` → 2024-01-05. Anything else → `None`.
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    name.strip_suffix(ARCHIVE_SUFFIX).and_then(parse_date_param)
}

/// Archive file name for a date.
pub fn file_name_for(date: NaiveDate) -> String {
    format!("{}{}", date.format(DATE_FORMAT), ARCHIVE_SUFFIX)
}

/// Strict `YYYY-MM-DD` parse. chrono alone accepts `2024-1-5`, which would
/// never match an archive name, so the shape is checked first.
pub fn parse_date_param(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter().enumerate().all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}
