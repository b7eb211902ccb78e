mod sqlite;

use pitchlens_core::{RecordFilter, SeasonRecord};
use thiserror::Error;

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read side of season storage. Implementations return every record matching
/// `filter` in no particular order.
pub trait SeasonRecordSource {
    fn fetch_season_records(&self, filter: &RecordFilter) -> Result<Vec<SeasonRecord>, StoreError>;
}

impl<T: SeasonRecordSource + ?Sized> SeasonRecordSource for &T {
    fn fetch_season_records(&self, filter: &RecordFilter) -> Result<Vec<SeasonRecord>, StoreError> {
        (**self).fetch_season_records(filter)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<SeasonRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<SeasonRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: SeasonRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<SeasonRecord> for InMemorySource {
    fn from_iter<I: IntoIterator<Item = SeasonRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl SeasonRecordSource for InMemorySource {
    fn fetch_season_records(&self, filter: &RecordFilter) -> Result<Vec<SeasonRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pitchlens_core::Role;

    use super::*;

    #[test]
    fn in_memory_source_applies_filter() {
        let source = [
            SeasonRecord::new(1, "Ace", 2023, Role::Starter).with_innings(190.0),
            SeasonRecord::new(2, "Closer", 2023, Role::Reliever).with_innings(62.0),
            SeasonRecord::new(1, "Ace", 2024, Role::Starter).with_innings(40.0),
        ]
        .into_iter()
        .collect::<InMemorySource>();
        assert_eq!(source.len(), 3);

        let starters = source
            .fetch_season_records(&RecordFilter::all_years(Some(Role::Starter), 50.0))
            .expect("fetch starters");
        assert_eq!(starters.len(), 1);
        assert_eq!(starters[0].year, 2023);

        let everything = (&source)
            .fetch_season_records(&RecordFilter::all_years(None, 0.0))
            .expect("fetch all");
        assert_eq!(everything.len(), 3);
    }
}
