use bincode::{de::Decoder, error::DecodeError, Decode, Encode};

use crate::utils::SerializableHashMap;

/// Occurrence counts of terms (or space-joined term pairs).
///
/// Every present key has a count of at least 1; absent keys have a count of 0.
#[derive(Clone, Debug, Default, Encode)]
pub struct Dictionary {
    counts: SerializableHashMap<String, u32>,
    total: u64,
}

impl Decode for Dictionary {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self {
            counts: Decode::decode(decoder)?,
            total: Decode::decode(decoder)?,
        })
    }
}

impl Dictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count of `key`.
    pub fn add(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count += 1;
        } else {
            self.counts.insert(key.to_string(), 1);
        }
        self.total += 1;
    }

    /// Gets the count of `key`, or 0 if it was never added.
    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    /// Gets the sum of all counts.
    pub const fn total_count(&self) -> u64 {
        self.total
    }

    /// Gets the number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(key, count)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_counts() {
        let mut dict = Dictionary::new();
        dict.add("the");
        dict.add("cat");
        dict.add("the");

        assert_eq!(2, dict.count("the"));
        assert_eq!(1, dict.count("cat"));
        assert_eq!(0, dict.count("dog"));
        assert!(dict.contains("cat"));
        assert!(!dict.contains("dog"));
        assert_eq!(3, dict.total_count());
        assert_eq!(2, dict.len());
    }

    #[test]
    fn test_dictionary_empty() {
        let dict = Dictionary::new();

        assert!(dict.is_empty());
        assert_eq!(0, dict.total_count());
        assert_eq!(0, dict.iter().count());
    }
}
