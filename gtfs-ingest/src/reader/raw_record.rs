use std::collections::HashMap;

use crate::ingest_error::IngestError;

/// one parsed row from a feed file, a mapping of column name to string
/// value. rows are ephemeral and consumed by the resolvers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(fields: HashMap<String, String>) -> RawRecord {
        RawRecord { fields }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> RawRecord
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRecord { fields }
    }

    /// a required field. an absent or empty value is a data error the caller
    /// surfaces against the enclosing record.
    pub fn get(&self, field: &'static str) -> Result<&str, IngestError> {
        self.get_opt(field)
            .ok_or(IngestError::MissingFieldError(field))
    }

    /// an optional field, trimmed. empty values read as None.
    pub fn get_opt(&self, field: &str) -> Option<&str> {
        match self.fields.get(field) {
            Some(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed)
                }
            }
            None => None,
        }
    }
}
