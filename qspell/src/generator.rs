use hashbrown::HashSet;

use crate::candidate::{cartesian_product, Candidate, EditDistanceTable, Substitution};
use crate::cost_model::EditCostModel;
use crate::errors::{QspellError, Result};
use crate::language_model::LanguageModel;
use crate::utils::{edit_distance, tokenize};

/// Characters that may be inserted or substituted by a single edit.
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz0123456789 ,'";

/// Default number of alternatives kept per query word.
pub const DEFAULT_MAX_ALTERNATIVES: usize = 4;

/// Default number of alternatives kept per word for long queries.
pub const DEFAULT_LONG_QUERY_MAX_ALTERNATIVES: usize = 3;

/// Queries with at least this many words are long queries.
pub const LONG_QUERY_WORDS: usize = 4;

/// Gets every distinct string one deletion, transposition, insertion or substitution away from
/// `word`, excluding `word` itself.
pub fn edits1(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut seen = HashSet::new();
    let mut edits = vec![];
    let mut push = |edit: String| {
        if edit != word && seen.insert(edit.clone()) {
            edits.push(edit);
        }
    };

    for i in 0..chars.len() {
        push(chars[..i].iter().chain(&chars[i + 1..]).collect());
    }
    for i in 1..chars.len() {
        let mut swapped = chars.clone();
        swapped.swap(i - 1, i);
        push(swapped.into_iter().collect());
    }
    for i in 0..=chars.len() {
        for c in ALPHABET.chars() {
            push(
                chars[..i]
                    .iter()
                    .chain(&[c])
                    .chain(&chars[i..])
                    .collect(),
            );
        }
    }
    for i in 0..chars.len() {
        for c in ALPHABET.chars() {
            if c != chars[i] {
                let mut replaced = chars.clone();
                replaced[i] = c;
                push(replaced.into_iter().collect());
            }
        }
    }
    edits
}

/// Scores an alternative by `log P(replacement) + log P(original | replacement)`.
fn alternative_score(
    lm: &LanguageModel,
    cost: EditCostModel<'_>,
    alternative: &Substitution,
) -> f64 {
    lm.phrase_log_prob(alternative.replacement())
        + cost
            .edit_probability(
                alternative.replacement(),
                alternative.original(),
                alternative.distance(),
            )
            .ln()
}

/// Orders alternatives for one word, most likely first.
///
/// Alternatives are ranked by [language-model log-probability of the replacement] + [log edit
/// probability], descending. Ties are broken by the smaller distance, then by the lexical order
/// of the replacement.
pub fn rank_alternatives(
    lm: &LanguageModel,
    cost: EditCostModel<'_>,
    alternatives: Vec<Substitution>,
) -> Vec<Substitution> {
    let mut scored: Vec<(f64, Substitution)> = alternatives
        .into_iter()
        .map(|s| (alternative_score(lm, cost, &s), s))
        .collect();
    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| a.distance().cmp(&b.distance()))
            .then_with(|| a.replacement().cmp(b.replacement()))
    });
    scored.into_iter().map(|(_, s)| s).collect()
}

/// Proposes whole-query corrections.
///
/// Each word gets a short list of alternatives found by edit-distance search, falling back to
/// terms seen next to its neighbors. The word itself is always one of them, so the original
/// query is always a candidate.
pub struct CandidateGenerator<'a> {
    lm: &'a LanguageModel,
    cost: EditCostModel<'a>,
    max_alternatives: usize,
    long_query_max_alternatives: usize,
}

impl<'a> CandidateGenerator<'a> {
    /// Creates a new generator.
    ///
    /// # Arguments
    ///
    /// * `lm` - Language model used for dictionary lookups and adjacency.
    /// * `cost` - Edit-cost model used to rank alternatives.
    pub const fn new(lm: &'a LanguageModel, cost: EditCostModel<'a>) -> Self {
        Self {
            lm,
            cost,
            max_alternatives: DEFAULT_MAX_ALTERNATIVES,
            long_query_max_alternatives: DEFAULT_LONG_QUERY_MAX_ALTERNATIVES,
        }
    }

    /// Sets the number of alternatives kept per word, including the word itself.
    ///
    /// Values less than 1 are treated as 1.
    pub fn max_alternatives(mut self, size: usize) -> Self {
        self.max_alternatives = size.max(1);
        self
    }

    /// Sets the number of alternatives kept per word for queries of [`LONG_QUERY_WORDS`] or
    /// more words.
    ///
    /// Values less than 1 are treated as 1.
    pub fn long_query_max_alternatives(mut self, size: usize) -> Self {
        self.long_query_max_alternatives = size.max(1);
        self
    }

    fn alternatives_cap(&self, n_words: usize) -> usize {
        if n_words >= LONG_QUERY_WORDS {
            self.long_query_max_alternatives
        } else {
            self.max_alternatives
        }
    }

    /// Generates whole-query candidates for `query`.
    ///
    /// Every pair of (query word, alternative) considered is recorded in `table`.
    ///
    /// # Errors
    ///
    /// [`QspellError::Generation`] is returned if a word or the whole query ends up with no
    /// candidate.
    pub fn generate(&self, query: &str, table: &mut EditDistanceTable) -> Result<Vec<Candidate>> {
        let words = tokenize(query);
        let mut per_word = Vec::with_capacity(words.len());
        for index in 0..words.len() {
            let alternatives = self.alternatives(&words, index, table);
            if alternatives.is_empty() {
                return Err(QspellError::generation(
                    query,
                    format!("no alternative for {:?}", words[index]),
                ));
            }
            per_word.push(alternatives);
        }
        let candidates = cartesian_product(per_word);
        if candidates.is_empty() {
            return Err(QspellError::generation(query, "no candidate"));
        }
        Ok(candidates)
    }

    /// Gets the ranked, truncated alternatives of `words[index]`.
    pub fn alternatives(
        &self,
        words: &[String],
        index: usize,
        table: &mut EditDistanceTable,
    ) -> Vec<Substitution> {
        let word = words[index].as_str();
        table.record(word, word, 0);

        let mut found = vec![];
        let edits = edits1(word);
        for edit in &edits {
            table.record(word, edit, 1);
            if self.lm.is_known_term(edit) {
                found.push(Substitution::new(word, edit.as_str(), 1));
            }
        }

        if found.is_empty() && !self.lm.is_known_term(word) {
            found = self.known_edits2(word, &edits, table);
            if found.is_empty() {
                found = self.adjacent_terms(words, index, table);
            }
        }

        let cap = self.alternatives_cap(words.len());
        let mut alternatives: Vec<Substitution> = rank_alternatives(self.lm, self.cost, found)
            .into_iter()
            .take(cap - 1)
            .collect();
        alternatives.push(Substitution::unchanged(word));
        let alternatives = rank_alternatives(self.lm, self.cost, alternatives);

        log::debug!(
            "alternatives of {word:?}: {:?}",
            alternatives
                .iter()
                .map(Substitution::replacement)
                .collect::<Vec<_>>()
        );
        alternatives
    }

    /// Gets the known terms two edits away from `word`.
    fn known_edits2(
        &self,
        word: &str,
        edits: &[String],
        table: &mut EditDistanceTable,
    ) -> Vec<Substitution> {
        let mut seen = HashSet::new();
        let mut found = vec![];
        for edit in edits {
            for edit2 in edits1(edit) {
                if edit2 != word && self.lm.is_known_term(&edit2) && seen.insert(edit2.clone()) {
                    table.record(word, &edit2, 2);
                    found.push(Substitution::new(word, edit2, 2));
                }
            }
        }
        found
    }

    /// Gets terms seen before the next word or after the previous word, closest to
    /// `words[index]` first.
    fn adjacent_terms(
        &self,
        words: &[String],
        index: usize,
        table: &mut EditDistanceTable,
    ) -> Vec<Substitution> {
        let word = words[index].as_str();
        let mut neighbors = vec![];
        if let Some(next) = words.get(index + 1) {
            neighbors.extend(self.lm.terms_preceding(next));
        }
        if let Some(prev) = index.checked_sub(1).and_then(|i| words.get(i)) {
            neighbors.extend(self.lm.terms_following(prev));
        }

        let mut seen = HashSet::new();
        let mut scored: Vec<(u32, &str)> = neighbors
            .into_iter()
            .filter(|&term| term != word && seen.insert(term))
            .map(|term| (edit_distance(word, term), term))
            .collect();
        // Stable, so equally distant terms keep their adjacency order.
        scored.sort_by_key(|&(distance, _)| distance);
        scored.truncate(self.alternatives_cap(words.len()));

        scored
            .into_iter()
            .map(|(distance, term)| {
                table.record(word, term, distance);
                Substitution::new(word, term, distance)
            })
            .collect()
    }
}
