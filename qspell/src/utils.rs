use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};
use hashbrown::HashMap;

/// Lowercases a line and splits it into whitespace-delimited terms.
pub fn tokenize(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Computes the Damerau-Levenshtein distance (optimal string alignment variant) between two
/// strings, counting insertions, deletions, substitutions and adjacent transpositions.
pub fn edit_distance(s: &str, t: &str) -> u32 {
    if s == t {
        return 0;
    }
    let s: Vec<char> = s.chars().collect();
    let t: Vec<char> = t.chars().collect();
    if s.is_empty() {
        return t.len() as u32;
    }
    if t.is_empty() {
        return s.len() as u32;
    }

    // Three rolling rows: i-2, i-1 and i.
    let mut prev2 = vec![0u32; t.len() + 1];
    let mut prev: Vec<u32> = (0..=t.len() as u32).collect();
    let mut cur = vec![0u32; t.len() + 1];
    for i in 0..s.len() {
        cur[0] = i as u32 + 1;
        for j in 0..t.len() {
            let cost = u32::from(s[i] != t[j]);
            let mut d = (cur[j] + 1).min(prev[j + 1] + 1).min(prev[j] + cost);
            if i > 0 && j > 0 && s[i] == t[j - 1] && s[i - 1] == t[j] {
                d = d.min(prev2[j - 1] + 1);
            }
            cur[j + 1] = d;
        }
        std::mem::swap(&mut prev2, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[t.len()]
}

/// A hash map encoded as a key-sorted list of pairs, so that identical contents always produce
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializableHashMap<K, V>(pub HashMap<K, V>)
where
    K: Eq + Hash;

impl<K, V> Default for SerializableHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<K, V> Deref for SerializableHashMap<K, V>
where
    K: Eq + Hash,
{
    type Target = HashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K, V> DerefMut for SerializableHashMap<K, V>
where
    K: Eq + Hash,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K, V> Decode for SerializableHashMap<K, V>
where
    K: Decode + Eq + Hash,
    V: Decode,
{
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        // The length is untrusted, so the map grows as pairs are actually read.
        let len: u64 = Decode::decode(decoder)?;
        let mut map = HashMap::new();
        for _ in 0..len {
            let (k, v): (K, V) = Decode::decode(decoder)?;
            map.insert(k, v);
        }
        Ok(Self(map))
    }
}

impl<K, V> Encode for SerializableHashMap<K, V>
where
    K: Encode + Eq + Hash + Ord,
    V: Encode,
{
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let mut raw: Vec<(&K, &V)> = self.0.iter().collect();
        raw.sort_unstable_by(|a, b| a.0.cmp(b.0));
        // bincode 2.0.0-rc.3 requires `T: 'static` for `Vec<T>: Encode`, so the
        // Vec wire format (u64 length, then each element) is written directly.
        Encode::encode(&(raw.len() as u64), encoder)?;
        for pair in &raw {
            Encode::encode(pair, encoder)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            vec!["stanford", "university"],
            tokenize("  Stanford\tUNIVERSITY \n")
        );
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_edit_distance_basic() {
        assert_eq!(0, edit_distance("cat", "cat"));
        assert_eq!(3, edit_distance("", "cat"));
        assert_eq!(3, edit_distance("cat", ""));
        assert_eq!(1, edit_distance("cat", "cut"));
        assert_eq!(1, edit_distance("cat", "cats"));
        assert_eq!(1, edit_distance("cat", "at"));
        assert_eq!(3, edit_distance("kitten", "sitting"));
    }

    #[test]
    fn test_edit_distance_transposition() {
        assert_eq!(1, edit_distance("stanofrd", "stanford"));
        assert_eq!(1, edit_distance("ab", "ba"));
    }

    #[test]
    fn test_edit_distance_multibyte() {
        assert_eq!(1, edit_distance("café", "cafe"));
        assert_eq!(1, edit_distance("né", "én"));
    }

    #[test]
    fn test_serializable_hash_map_is_deterministic() {
        let config = bincode::config::standard();

        let mut a = SerializableHashMap::default();
        let mut b = SerializableHashMap::default();
        for (k, v) in [("zeta", 1u32), ("alpha", 2), ("mu", 3)] {
            a.insert(k.to_string(), v);
        }
        for (k, v) in [("mu", 3u32), ("zeta", 1), ("alpha", 2)] {
            b.insert(k.to_string(), v);
        }
        let a_bytes = bincode::encode_to_vec(&a, config).unwrap();
        let b_bytes = bincode::encode_to_vec(&b, config).unwrap();
        assert_eq!(a_bytes, b_bytes);

        let (decoded, _): (SerializableHashMap<String, u32>, usize) =
            bincode::decode_from_slice(&a_bytes, config).unwrap();
        assert_eq!(a, decoded);
    }

    #[test]
    fn test_serializable_hash_map_decode_truncated() {
        let config = bincode::config::standard();

        let mut data = vec![0xFD];
        data.extend_from_slice(&(u64::MAX / 4).to_le_bytes());
        let result: Result<(SerializableHashMap<String, u32>, usize), _> =
            bincode::decode_from_slice(&data, config);
        assert!(matches!(result, Err(DecodeError::UnexpectedEnd { .. })));
    }
}
