//! Base implementation of records.
use crate::error::AgentError;
use std::collections::{hash_map::Iter, HashMap};

/// Represents possible types of values in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value, e.g. a loss.
    Scalar(f32),

    /// A 1-dimensional array, e.g. per-dimension policy std.
    Array1(Vec<f32>),
}

/// Container of key-value pairs.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a key-value pair.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Gets the value of the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, AgentError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(AgentError::RecordValueType("Scalar".to_string())),
            None => Err(AgentError::RecordKey(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, AgentError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(AgentError::RecordValueType("Array1".to_string())),
            None => Err(AgentError::RecordKey(k.to_string())),
        }
    }

    /// Returns `true` if the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_with_wrong_type_or_key() {
        let record = Record::from_slice(&[
            ("loss", RecordValue::Scalar(1.5)),
            ("policy_std", RecordValue::Array1(vec![0.5, 0.25])),
        ]);

        assert_eq!(record.len(), 2);
        assert_eq!(record.get_scalar("loss"), Ok(1.5));
        assert_eq!(record.get_array1("policy_std"), Ok(vec![0.5, 0.25]));
        assert_eq!(
            record.get_scalar("policy_std"),
            Err(AgentError::RecordValueType("Scalar".to_string()))
        );
        assert_eq!(
            record.get_array1("loss"),
            Err(AgentError::RecordValueType("Array1".to_string()))
        );
        assert_eq!(
            record.get_array1("std"),
            Err(AgentError::RecordKey("std".to_string()))
        );
    }

    #[test]
    fn test_insert_overwrites() {
        let mut record = Record::empty();
        assert!(record.is_empty());
        record.insert("alpha", RecordValue::Scalar(0.2));
        record.insert("alpha", RecordValue::Scalar(0.1));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get_scalar("alpha"), Ok(0.1));
    }
}
