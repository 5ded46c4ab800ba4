use std::fmt;

use hashbrown::HashMap;

use crate::errors::{QspellError, Result};

/// One query word and the string chosen to replace it.
///
/// The replacement may contain a space when an edit split the word into a known bigram.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Substitution {
    original: String,
    replacement: String,
    distance: u32,
}

impl Substitution {
    pub fn new<O, R>(original: O, replacement: R, distance: u32) -> Self
    where
        O: Into<String>,
        R: Into<String>,
    {
        Self {
            original: original.into(),
            replacement: replacement.into(),
            distance,
        }
    }

    /// Creates a substitution that keeps `word` as is.
    pub fn unchanged<S>(word: S) -> Self
    where
        S: Into<String>,
    {
        let word = word.into();
        Self {
            replacement: word.clone(),
            original: word,
            distance: 0,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Gets the edit distance between the original word and its replacement.
    pub const fn distance(&self) -> u32 {
        self.distance
    }
}

/// A full correction hypothesis: one substitution per query word, in query order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Candidate {
    substitutions: Vec<Substitution>,
}

impl Candidate {
    pub fn new(substitutions: Vec<Substitution>) -> Self {
        Self { substitutions }
    }

    /// Creates a candidate that leaves every word unchanged.
    pub fn unchanged<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(words.into_iter().map(Substitution::unchanged).collect())
    }

    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// Gets the terms of the corrected query.
    ///
    /// Replacements containing a space contribute more than one term.
    pub fn terms(&self) -> Vec<&str> {
        self.substitutions
            .iter()
            .flat_map(|s| s.replacement.split_whitespace())
            .collect()
    }

    /// Gets the sum of the distances of all substitutions.
    pub fn total_distance(&self) -> u32 {
        self.substitutions.iter().map(|s| s.distance).sum()
    }

    /// Returns `true` if every word is kept as is.
    pub fn is_unchanged(&self) -> bool {
        self.substitutions
            .iter()
            .all(|s| s.original == s.replacement)
    }
}

/// Formats the corrected query, terms separated by single spaces.
impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, term) in self.terms().into_iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{term}")?;
        }
        Ok(())
    }
}

/// Edit distances found while generating candidates for one query.
///
/// The generator records every pair it proposes and the scorer looks them up, so the table
/// must not be shared between queries.
#[derive(Clone, Debug, Default)]
pub struct EditDistanceTable {
    distances: HashMap<String, HashMap<String, u32>>,
}

impl EditDistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `to` is `distance` edits away from `from`.
    ///
    /// Identical strings are always recorded as 0. If the pair is already present, the smaller
    /// distance is kept.
    pub fn record(&mut self, from: &str, to: &str, distance: u32) {
        let distance = if from == to { 0 } else { distance };
        let entry = self
            .distances
            .entry_ref(from)
            .or_default()
            .entry_ref(to)
            .or_insert(distance);
        if distance < *entry {
            *entry = distance;
        }
    }

    pub fn get(&self, from: &str, to: &str) -> Option<u32> {
        self.distances.get(from)?.get(to).copied()
    }

    /// Gets the recorded distance from `from` to `to`.
    ///
    /// # Errors
    ///
    /// If the pair was never recorded, [`QspellError::MissingEditDistance`] will be returned.
    pub fn distance(&self, from: &str, to: &str) -> Result<u32> {
        self.get(from, to)
            .ok_or_else(|| QspellError::missing_edit_distance(from, to))
    }

    /// Gets the number of recorded pairs.
    pub fn len(&self) -> usize {
        self.distances.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn clear(&mut self) {
        self.distances.clear();
    }
}

/// Builds every combination that picks one substitution from each position, in order.
///
/// Combinations are enumerated with earlier positions varying slowest. An empty input yields a
/// single empty candidate; an empty position yields nothing.
pub fn cartesian_product(alternatives: Vec<Vec<Substitution>>) -> Vec<Candidate> {
    alternatives
        .into_iter()
        .fold(vec![vec![]], |prefixes, choices| {
            let mut extended = Vec::with_capacity(prefixes.len() * choices.len());
            for prefix in &prefixes {
                for choice in &choices {
                    let mut next: Vec<Substitution> = prefix.clone();
                    next.push(choice.clone());
                    extended.push(next);
                }
            }
            extended
        })
        .into_iter()
        .map(Candidate::new)
        .collect()
}
