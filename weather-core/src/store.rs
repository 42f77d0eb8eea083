use crate::model::WeatherRecord;

/// Ordered collection of fetched records, newest first, at most one per name.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<WeatherRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the record with the same name in place, or insert at the front.
    pub fn upsert(&mut self, record: WeatherRecord) {
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.insert(0, record),
        }
    }

    pub fn all(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn get(&self, name: &str) -> Option<&WeatherRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }
}
