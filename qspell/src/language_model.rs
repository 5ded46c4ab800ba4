use std::collections::BTreeSet;

use bincode::{de::Decoder, error::DecodeError, Decode, Encode};
use hashbrown::HashMap;

use crate::dictionary::Dictionary;
use crate::errors::{QspellError, Result};
use crate::utils::{tokenize, SerializableHashMap};

/// Default weight of the unigram term when interpolating bigram probabilities.
pub const DEFAULT_LM_INTERPOLATION: f64 = 0.1;

fn bigram_key(w1: &str, w2: &str) -> String {
    format!("{w1} {w2}")
}

/// Orders neighbor terms by score, descending. Equal scores are ordered lexically.
fn rank_neighbors(mut scored: Vec<(&str, f64)>) -> Vec<&str> {
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored.into_iter().map(|(term, _)| term).collect()
}

/// Smoothed unigram/bigram language model.
///
/// Bigram probabilities are linearly interpolated with the unigram probability of the second
/// term:
///
/// ```text
/// P(w2 | w1) = λ·P(w2) + (1 - λ)·count(w1 w2) / count(w1)
/// ```
///
/// so a bigram never seen in training still gets `λ·P(w2)`.
#[derive(Clone, Debug, Encode)]
pub struct LanguageModel {
    unigrams: Dictionary,
    bigrams: Dictionary,
    unigram_probs: SerializableHashMap<String, f64>,
    bigram_probs: SerializableHashMap<String, f64>,
    preceding: SerializableHashMap<String, Vec<String>>,
    following: SerializableHashMap<String, Vec<String>>,
    lambda: f64,
}

impl Decode for LanguageModel {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self {
            unigrams: Decode::decode(decoder)?,
            bigrams: Decode::decode(decoder)?,
            unigram_probs: Decode::decode(decoder)?,
            bigram_probs: Decode::decode(decoder)?,
            preceding: Decode::decode(decoder)?,
            following: Decode::decode(decoder)?,
            lambda: Decode::decode(decoder)?,
        })
    }
}

impl LanguageModel {
    /// Trains a model with the default interpolation weight.
    ///
    /// Each line is one document; empty lines are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use qspell::LanguageModel;
    ///
    /// let lm = LanguageModel::train(["the cat sat", "the dog sat"]);
    /// assert!(lm.is_known_term("cat"));
    /// assert!(lm.is_known_term("the dog"));
    /// assert!(!lm.is_known_term("bird"));
    /// ```
    pub fn train<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trainer = LanguageModelTrainer::default();
        for line in lines {
            trainer.push_line(line.as_ref());
        }
        trainer.train()
    }

    /// Gets the unigram counts.
    pub const fn unigrams(&self) -> &Dictionary {
        &self.unigrams
    }

    /// Gets the bigram counts, keyed by the two terms joined with a space.
    pub const fn bigrams(&self) -> &Dictionary {
        &self.bigrams
    }

    /// Gets the interpolation weight λ used for bigram smoothing.
    pub const fn interpolation(&self) -> f64 {
        self.lambda
    }

    /// Returns `true` if `term` was seen as a unigram, or as a space-joined bigram.
    pub fn is_known_term(&self, term: &str) -> bool {
        self.unigrams.contains(term) || self.bigrams.contains(term)
    }

    /// Gets `P(term)`, or 0 if unseen.
    pub fn unigram_prob(&self, term: &str) -> f64 {
        self.unigram_probs.get(term).copied().unwrap_or(0.0)
    }

    /// Gets `log P(term)`, or negative infinity if unseen.
    pub fn unigram_log_prob(&self, term: &str) -> f64 {
        self.unigram_prob(term).ln()
    }

    /// Gets the interpolated `P(w2 | w1)`. Falls back to `λ·P(w2)` for unseen bigrams.
    pub fn bigram_prob(&self, w1: &str, w2: &str) -> f64 {
        self.bigram_probs
            .get(&bigram_key(w1, w2))
            .copied()
            .unwrap_or_else(|| self.lambda * self.unigram_prob(w2))
    }

    /// Gets the interpolated `log P(w2 | w1)`.
    pub fn bigram_log_prob(&self, w1: &str, w2: &str) -> f64 {
        self.bigram_prob(w1, w2).ln()
    }

    /// Scores a whitespace-separated phrase as `log P(t1) + Σ log P(ti | ti-1)`.
    ///
    /// An empty phrase scores 0.
    pub fn phrase_log_prob(&self, phrase: &str) -> f64 {
        let mut terms = phrase.split_whitespace();
        let Some(first) = terms.next() else {
            return 0.0;
        };
        let mut score = self.unigram_log_prob(first);
        let mut prev = first;
        for term in terms {
            score += self.bigram_log_prob(prev, term);
            prev = term;
        }
        score
    }

    /// Terms observed immediately before `term`, most likely first.
    ///
    /// A preceding term `p` is scored by `log P(term | p) + log P(p)`.
    pub fn terms_preceding(&self, term: &str) -> Vec<&str> {
        let Some(neighbors) = self.preceding.get(term) else {
            return vec![];
        };
        rank_neighbors(
            neighbors
                .iter()
                .map(|p| (p.as_str(), self.bigram_log_prob(p, term) + self.unigram_log_prob(p)))
                .collect(),
        )
    }

    /// Terms observed immediately after `term`, most likely first.
    ///
    /// A following term `f` is scored by `log P(f | term) + log P(f)`.
    pub fn terms_following(&self, term: &str) -> Vec<&str> {
        let Some(neighbors) = self.following.get(term) else {
            return vec![];
        };
        rank_neighbors(
            neighbors
                .iter()
                .map(|f| (f.as_str(), self.bigram_log_prob(term, f) + self.unigram_log_prob(f)))
                .collect(),
        )
    }

    /// Terms observed on either side of `term`, most likely first.
    ///
    /// A term seen on both sides keeps its better score.
    pub fn terms_preceding_or_following(&self, term: &str) -> Vec<&str> {
        let mut best: HashMap<&str, f64> = HashMap::new();
        let preceding = self.preceding.get(term).into_iter().flatten().map(|p| {
            (p.as_str(), self.bigram_log_prob(p, term) + self.unigram_log_prob(p))
        });
        let following = self.following.get(term).into_iter().flatten().map(|f| {
            (f.as_str(), self.bigram_log_prob(term, f) + self.unigram_log_prob(f))
        });
        for (neighbor, score) in preceding.chain(following) {
            let entry = best.entry(neighbor).or_insert(f64::NEG_INFINITY);
            if score > *entry {
                *entry = score;
            }
        }
        rank_neighbors(best.into_iter().collect())
    }
}

/// Accumulates corpus counts and produces a [`LanguageModel`].
///
/// # Examples
///
/// ```
/// use qspell::LanguageModelTrainer;
///
/// let mut trainer = LanguageModelTrainer::new(0.2).unwrap();
/// trainer.push_line("stanford university");
/// trainer.push_line("");
/// assert_eq!(1, trainer.n_lines());
///
/// let lm = trainer.train();
/// assert_eq!(0.5, lm.unigram_prob("stanford"));
/// ```
pub struct LanguageModelTrainer {
    unigrams: Dictionary,
    bigrams: Dictionary,
    preceding: HashMap<String, BTreeSet<String>>,
    following: HashMap<String, BTreeSet<String>>,
    lambda: f64,
    n_lines: usize,
}

impl Default for LanguageModelTrainer {
    fn default() -> Self {
        Self {
            unigrams: Dictionary::new(),
            bigrams: Dictionary::new(),
            preceding: HashMap::new(),
            following: HashMap::new(),
            lambda: DEFAULT_LM_INTERPOLATION,
            n_lines: 0,
        }
    }
}

impl LanguageModelTrainer {
    /// Creates a new trainer.
    ///
    /// # Arguments
    ///
    /// * `lambda` - Weight of the unigram term in bigram interpolation.
    ///
    /// # Errors
    ///
    /// `lambda` must be in `(0, 1]`, otherwise [`QspellError::InvalidArgument`] is returned.
    pub fn new(lambda: f64) -> Result<Self> {
        if !(lambda > 0.0 && lambda <= 1.0) {
            return Err(QspellError::invalid_argument(
                "lambda",
                format!("must be in (0, 1], but got {lambda}"),
            ));
        }
        Ok(Self {
            lambda,
            ..Self::default()
        })
    }

    /// Adds one corpus line (one document) to the counts.
    pub fn push_line(&mut self, line: &str) {
        let terms = tokenize(line);
        let Some((first, rest)) = terms.split_first() else {
            return;
        };
        self.n_lines += 1;
        self.unigrams.add(first);
        let mut prev = first;
        for term in rest {
            self.unigrams.add(term);
            self.bigrams.add(&bigram_key(prev, term));
            self.following
                .entry_ref(prev.as_str())
                .or_default()
                .insert(term.clone());
            self.preceding
                .entry_ref(term.as_str())
                .or_default()
                .insert(prev.clone());
            prev = term;
        }
    }

    /// Gets the number of non-empty lines consumed so far.
    pub const fn n_lines(&self) -> usize {
        self.n_lines
    }

    /// Gets the number of terms consumed so far.
    pub const fn n_terms(&self) -> u64 {
        self.unigrams.total_count()
    }

    /// Computes the smoothed probabilities and returns the model.
    pub fn train(self) -> LanguageModel {
        let total = self.unigrams.total_count() as f64;
        let mut unigram_probs = SerializableHashMap::default();
        for (term, count) in self.unigrams.iter() {
            unigram_probs.insert(term.to_string(), f64::from(count) / total);
        }

        let mut bigram_probs = SerializableHashMap::default();
        for (key, count) in self.bigrams.iter() {
            // Bigram keys are built from whitespace-free terms.
            let Some((w1, w2)) = key.split_once(' ') else {
                continue;
            };
            let raw = f64::from(count) / f64::from(self.unigrams.count(w1));
            let p_w2 = unigram_probs.get(w2).copied().unwrap_or(0.0);
            bigram_probs.insert(
                key.to_string(),
                self.lambda * p_w2 + (1.0 - self.lambda) * raw,
            );
        }

        let into_sorted = |map: HashMap<String, BTreeSet<String>>| -> SerializableHashMap<_, _> {
            SerializableHashMap(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_iter().collect::<Vec<_>>()))
                    .collect(),
            )
        };

        LanguageModel {
            unigrams: self.unigrams,
            bigrams: self.bigrams,
            unigram_probs,
            bigram_probs,
            preceding: into_sorted(self.preceding),
            following: into_sorted(self.following),
            lambda: self.lambda,
        }
    }
}
