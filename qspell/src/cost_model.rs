use std::fmt;
use std::str::FromStr;

use bincode::{de::Decoder, error::DecodeError, Decode, Encode};
use hashbrown::HashMap;

use crate::edit_operation::{align, Alignment, EditOperation, WORD_START};
use crate::errors::{QspellError, Result};
use crate::utils::SerializableHashMap;

/// Probability that the user typed what they intended.
pub const ZERO_EDIT_PROBABILITY: f64 = 0.95;

/// Probability of each single edit under the uniform model.
pub const UNIFORM_EDIT_PROBABILITY: f64 = 0.01;

/// Which edit-cost model to use for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostModelKind {
    /// Every edit has the same probability.
    Uniform,

    /// Edit probabilities are learned from noisy/clean query pairs.
    Empirical,
}

impl FromStr for CostModelKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "empirical" => Ok(Self::Empirical),
            _ => Err("must be one of <uniform | empirical>"),
        }
    }
}

impl fmt::Display for CostModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Empirical => write!(f, "empirical"),
        }
    }
}

/// Edit model where the probability decays exponentially with the edit distance.
#[derive(Clone, Copy, Debug, PartialEq, Encode, Decode)]
pub struct UniformCostModel {
    zero_edit_probability: f64,
    edit_probability: f64,
}

impl Default for UniformCostModel {
    fn default() -> Self {
        Self {
            zero_edit_probability: ZERO_EDIT_PROBABILITY,
            edit_probability: UNIFORM_EDIT_PROBABILITY,
        }
    }
}

impl UniformCostModel {
    /// Creates a new uniform model.
    ///
    /// # Arguments
    ///
    /// * `zero_edit_probability` - Probability returned when nothing was edited.
    /// * `edit_probability` - Probability of one edit. `d` edits give `edit_probability^d`.
    ///
    /// # Errors
    ///
    /// Both values must be in `(0, 1]` and `edit_probability` must be less than
    /// `zero_edit_probability`.
    pub fn new(zero_edit_probability: f64, edit_probability: f64) -> Result<Self> {
        if !(zero_edit_probability > 0.0 && zero_edit_probability <= 1.0) {
            return Err(QspellError::invalid_argument(
                "zero_edit_probability",
                format!("must be in (0, 1], but got {zero_edit_probability}"),
            ));
        }
        if !(edit_probability > 0.0 && edit_probability < zero_edit_probability) {
            return Err(QspellError::invalid_argument(
                "edit_probability",
                format!(
                    "must be in (0, {zero_edit_probability}), but got {edit_probability}"
                ),
            ));
        }
        Ok(Self {
            zero_edit_probability,
            edit_probability,
        })
    }

    pub const fn zero_edit_probability(&self) -> f64 {
        self.zero_edit_probability
    }

    /// Gets `P(observed | intended)` for strings `distance` edits apart.
    pub fn edit_probability(&self, intended: &str, observed: &str, distance: u32) -> f64 {
        if distance == 0 || intended == observed {
            return self.zero_edit_probability;
        }
        let exponent = i32::try_from(distance).unwrap_or(i32::MAX);
        self.edit_probability
            .powi(exponent)
            .max(f64::MIN_POSITIVE)
    }
}

/// Edit model learned from noisy/clean query pairs.
///
/// A single edit seen in training gets a Laplace-smoothed
/// `(count(edit) + 1) / (count(intended k-gram) + #k-grams)`. Anything else falls back to the
/// uniform model.
#[derive(Clone, Debug, Default, Encode)]
pub struct EmpiricalCostModel {
    edit_counts: SerializableHashMap<EditOperation, u32>,
    kgram_counts: SerializableHashMap<String, u32>,
    fallback: UniformCostModel,
}

impl Decode for EmpiricalCostModel {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self {
            edit_counts: Decode::decode(decoder)?,
            kgram_counts: Decode::decode(decoder)?,
            fallback: Decode::decode(decoder)?,
        })
    }
}

impl EmpiricalCostModel {
    /// Gets `P(observed | intended)` for strings `distance` edits apart.
    pub fn edit_probability(&self, intended: &str, observed: &str, distance: u32) -> f64 {
        if distance == 0 || intended == observed {
            return self.fallback.zero_edit_probability();
        }
        if let Alignment::Single(op) = align(observed, intended) {
            if let (Some(&count), Some(&kgram_count)) = (
                self.edit_counts.get(&op),
                self.kgram_counts.get(&op.intended_kgram()),
            ) {
                let vocab = self.kgram_counts.len() as f64;
                return (f64::from(count) + 1.0) / (f64::from(kgram_count) + vocab);
            }
        }
        self.fallback.edit_probability(intended, observed, distance)
    }

    /// Gets how many times `op` was seen in training.
    pub fn edit_count(&self, op: &EditOperation) -> u32 {
        self.edit_counts.get(op).copied().unwrap_or(0)
    }

    /// Gets how many times `kgram` occurred on the clean side of training pairs.
    pub fn kgram_count(&self, kgram: &str) -> u32 {
        self.kgram_counts.get(kgram).copied().unwrap_or(0)
    }

    /// Iterates over learned `(edit, count)` pairs in arbitrary order.
    pub fn edits(&self) -> impl Iterator<Item = (&EditOperation, u32)> {
        self.edit_counts.iter().map(|(op, &count)| (op, count))
    }

    /// Gets the number of distinct k-grams, i.e. the smoothing vocabulary size.
    pub fn n_kgrams(&self) -> usize {
        self.kgram_counts.len()
    }
}

/// Mines noisy/clean query pairs into an [`EmpiricalCostModel`].
///
/// Only pairs that differ by at most one edit are used. Other pairs are skipped and counted,
/// or rejected with an error in strict mode.
///
/// # Examples
///
/// ```
/// use qspell::{Alignment, EditOperation, EmpiricalCostTrainer};
///
/// let mut trainer = EmpiricalCostTrainer::new();
/// trainer.push_pair("recieve", "receive").unwrap();
/// assert_eq!(Alignment::Multiple, trainer.push_pair("rcieve", "receive").unwrap());
/// assert_eq!(1, trainer.n_rejected());
///
/// let model = trainer.train();
/// assert_eq!(1, model.edit_count(&EditOperation::Transposition { first: 'e', second: 'i' }));
/// ```
#[derive(Default)]
pub struct EmpiricalCostTrainer {
    edit_counts: HashMap<EditOperation, u32>,
    kgram_counts: HashMap<String, u32>,
    fallback: UniformCostModel,
    strict: bool,
    n_pairs: usize,
    n_rejected: usize,
}

impl EmpiricalCostTrainer {
    /// Creates a new trainer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects multi-edit pairs with [`QspellError::MalformedPair`] instead of skipping them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the model used for edits never seen in training.
    pub fn fallback(mut self, fallback: UniformCostModel) -> Self {
        self.fallback = fallback;
        self
    }

    /// Adds a pair of a noisy query and its clean form.
    ///
    /// Both strings are lowercased before alignment.
    ///
    /// # Returns
    ///
    /// The alignment found for the pair. [`Alignment::Multiple`] pairs are not counted.
    ///
    /// # Errors
    ///
    /// In strict mode, a pair differing by more than one edit is a
    /// [`QspellError::MalformedPair`].
    pub fn push_pair(&mut self, noisy: &str, clean: &str) -> Result<Alignment> {
        let noisy = noisy.trim().to_lowercase();
        let clean = clean.trim().to_lowercase();
        let alignment = align(&noisy, &clean);
        match alignment {
            Alignment::Multiple => {
                if self.strict {
                    return Err(QspellError::malformed_pair(noisy, clean));
                }
                log::warn!("skipped a pair with more than one edit: {noisy:?} -> {clean:?}");
                self.n_rejected += 1;
                return Ok(alignment);
            }
            Alignment::Single(op) => {
                *self.edit_counts.entry(op).or_insert(0) += 1;
            }
            Alignment::Identical => (),
        }
        self.add_kgrams(&clean);
        self.n_pairs += 1;
        Ok(alignment)
    }

    fn add_kgrams(&mut self, clean: &str) {
        let mut prev = WORD_START;
        self.increment_kgram(String::from(prev));
        for c in clean.chars() {
            self.increment_kgram(String::from(c));
            self.increment_kgram([prev, c].iter().collect());
            prev = c;
        }
    }

    fn increment_kgram(&mut self, kgram: String) {
        *self.kgram_counts.entry(kgram).or_insert(0) += 1;
    }

    /// Gets the number of pairs used for training.
    pub const fn n_pairs(&self) -> usize {
        self.n_pairs
    }

    /// Gets the number of multi-edit pairs skipped.
    pub const fn n_rejected(&self) -> usize {
        self.n_rejected
    }

    pub fn train(self) -> EmpiricalCostModel {
        EmpiricalCostModel {
            edit_counts: SerializableHashMap(self.edit_counts),
            kgram_counts: SerializableHashMap(self.kgram_counts),
            fallback: self.fallback,
        }
    }
}

/// The edit-cost model selected for a run.
#[derive(Clone, Copy, Debug)]
pub enum EditCostModel<'a> {
    Uniform(&'a UniformCostModel),
    Empirical(&'a EmpiricalCostModel),
}

impl EditCostModel<'_> {
    /// Gets `P(observed | intended)` for strings `distance` edits apart.
    ///
    /// The result is always in `(0, 1]`.
    pub fn edit_probability(&self, intended: &str, observed: &str, distance: u32) -> f64 {
        match self {
            Self::Uniform(model) => model.edit_probability(intended, observed, distance),
            Self::Empirical(model) => model.edit_probability(intended, observed, distance),
        }
    }

    pub const fn kind(&self) -> CostModelKind {
        match self {
            Self::Uniform(_) => CostModelKind::Uniform,
            Self::Empirical(_) => CostModelKind::Empirical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_model_kind_from_str() {
        assert_eq!(Ok(CostModelKind::Uniform), "uniform".parse());
        assert_eq!(Ok(CostModelKind::Empirical), "empirical".parse());
        assert!("Uniform".parse::<CostModelKind>().is_err());
        assert!("".parse::<CostModelKind>().is_err());
        assert_eq!("empirical", CostModelKind::Empirical.to_string());
    }

    #[test]
    fn test_uniform_zero_edit() {
        let model = UniformCostModel::default();

        assert_eq!(ZERO_EDIT_PROBABILITY, model.edit_probability("cat", "cat", 0));
        assert_eq!(ZERO_EDIT_PROBABILITY, model.edit_probability("cat", "cat", 1));
        assert_eq!(ZERO_EDIT_PROBABILITY, model.edit_probability("cat", "cut", 0));
    }

    #[test]
    fn test_uniform_distance_monotonic() {
        let model = UniformCostModel::default();

        let mut last = model.edit_probability("cat", "cat", 0);
        for distance in 1..400 {
            let p = model.edit_probability("cat", "dog", distance);
            assert!(p > 0.0);
            assert!(p <= last);
            assert!(p < ZERO_EDIT_PROBABILITY);
            last = p;
        }
        assert_eq!(0.01, model.edit_probability("cat", "cut", 1));
    }

    #[test]
    fn test_uniform_new_invalid() {
        assert!(UniformCostModel::new(0.0, 0.01).is_err());
        assert!(UniformCostModel::new(1.1, 0.01).is_err());
        assert!(UniformCostModel::new(0.5, 0.5).is_err());
        assert!(UniformCostModel::new(0.5, 0.0).is_err());
        assert!(UniformCostModel::new(0.9, 0.1).is_ok());
    }

    #[test]
    fn test_empirical_trainer_counts() {
        let mut trainer = EmpiricalCostTrainer::new();
        trainer.push_pair("cet", "cat").unwrap();
        trainer.push_pair("Cet\n", "CAT").unwrap();
        trainer.push_pair("cat", "cat").unwrap();
        let model = trainer.train();

        let op = EditOperation::Substitution {
            typed: 'e',
            intended: 'a',
        };
        assert_eq!(2, model.edit_count(&op));
        assert_eq!(3, model.kgram_count("a"));
        assert_eq!(3, model.kgram_count("^c"));
        assert_eq!(3, model.kgram_count("ca"));
        assert_eq!(0, model.kgram_count("e"));
        // ^, c, a, t, ^c, ca, at
        assert_eq!(7, model.n_kgrams());
    }

    #[test]
    fn test_empirical_trainer_rejects_multiple_edits() {
        let mut trainer = EmpiricalCostTrainer::new();
        assert_eq!(
            Alignment::Multiple,
            trainer.push_pair("dgo", "cat").unwrap()
        );
        assert_eq!(0, trainer.n_pairs());
        assert_eq!(1, trainer.n_rejected());

        let model = trainer.train();
        assert_eq!(0, model.n_kgrams());

        let mut trainer = EmpiricalCostTrainer::new().strict(true);
        assert!(matches!(
            trainer.push_pair("dgo", "cat"),
            Err(QspellError::MalformedPair(_))
        ));
    }

    #[test]
    fn test_empirical_edit_probability() {
        let mut trainer = EmpiricalCostTrainer::new();
        trainer.push_pair("cet", "cat").unwrap();
        trainer.push_pair("cat", "cat").unwrap();
        let model = trainer.train();

        // count("e|a") = 1, count("a") = 2, 7 k-grams
        let p = model.edit_probability("cat", "cet", 1);
        assert_eq!(2.0 / 9.0, p);

        assert_eq!(ZERO_EDIT_PROBABILITY, model.edit_probability("cat", "cat", 0));
        // Unseen edit.
        assert_eq!(0.01, model.edit_probability("cat", "cut", 1));
        // Two edits.
        assert_eq!(0.01 * 0.01, model.edit_probability("cat", "cxx", 2));
    }

    #[test]
    fn test_empirical_insertion_and_deletion_probability() {
        let mut trainer = EmpiricalCostTrainer::new();
        trainer.push_pair("caat", "cat").unwrap();
        trainer.push_pair("at", "cat").unwrap();
        trainer.push_pair("cat", "cat").unwrap();
        trainer.push_pair("cot", "cot").unwrap();
        let model = trainer.train();

        // ^, c, a, t, o, ^c, ca, at, co, ot
        assert_eq!(10, model.n_kgrams());

        // Insertion of 'a' after 'a' is normalized by count("a") = 3.
        let op = EditOperation::Insertion {
            prev: 'a',
            inserted: 'a',
        };
        assert_eq!(1, model.edit_count(&op));
        assert_eq!(2.0 / 13.0, model.edit_probability("cat", "caat", 1));

        // Deletion of a leading 'c' is normalized by count("^c") = 4.
        let op = EditOperation::Deletion {
            prev: WORD_START,
            deleted: 'c',
        };
        assert_eq!(1, model.edit_count(&op));
        assert_eq!(4, model.kgram_count("^c"));
        assert_eq!(2.0 / 14.0, model.edit_probability("cat", "at", 1));
    }

    #[test]
    fn test_empirical_probability_in_range() {
        let mut trainer = EmpiricalCostTrainer::new();
        for _ in 0..10 {
            trainer.push_pair("teh", "the").unwrap();
        }
        let model = trainer.train();

        let p = model.edit_probability("the", "teh", 1);
        assert!(p > 0.0 && p <= 1.0);
    }

    #[test]
    fn test_edit_cost_model_dispatch() {
        let uniform = UniformCostModel::default();
        let empirical = EmpiricalCostModel::default();

        let model = EditCostModel::Uniform(&uniform);
        assert_eq!(CostModelKind::Uniform, model.kind());
        assert_eq!(0.01, model.edit_probability("cat", "cut", 1));

        let model = EditCostModel::Empirical(&empirical);
        assert_eq!(CostModelKind::Empirical, model.kind());
        assert_eq!(0.01, model.edit_probability("cat", "cut", 1));
    }
}
