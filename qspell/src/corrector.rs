use crate::candidate::{Candidate, EditDistanceTable};
use crate::cost_model::EditCostModel;
use crate::errors::{QspellError, Result};
use crate::generator::CandidateGenerator;
use crate::language_model::LanguageModel;

/// Default weight of the unigram term when scoring candidate sequences.
pub const DEFAULT_SCORE_INTERPOLATION: f64 = 0.95;

/// A candidate with its language-model and edit-cost log-probabilities.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    candidate: Candidate,
    language_score: f64,
    edit_score: f64,
}

impl ScoredCandidate {
    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn into_candidate(self) -> Candidate {
        self.candidate
    }

    /// Gets `log P(R)`.
    pub const fn language_score(&self) -> f64 {
        self.language_score
    }

    /// Gets `log P(Q | R)`.
    pub const fn edit_score(&self) -> f64 {
        self.edit_score
    }

    /// Gets the combined score `log P(R) + log P(Q | R)`.
    pub fn score(&self) -> f64 {
        self.language_score + self.edit_score
    }
}

/// Orders candidates by combined score, descending.
///
/// Ties are broken by the smaller total edit distance, then by the lexical order of the
/// corrected query.
pub fn rank_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by_cached_key(|c| {
        (
            std::cmp::Reverse(OrderedScore(c.score())),
            c.candidate.total_distance(),
            c.candidate.to_string(),
        )
    });
}

/// Total order over scores, used as a sort key.
#[derive(Clone, Copy, Debug)]
struct OrderedScore(f64);

impl PartialEq for OrderedScore {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0).is_eq()
    }
}

impl Eq for OrderedScore {}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Noisy-channel query corrector.
///
/// Picks the candidate `R` maximizing `log P(R) + log P(Q | R)` for an observed query `Q`.
///
/// # Examples
///
/// ```
/// use qspell::{Corrector, EditCostModel, LanguageModel, UniformCostModel};
///
/// let lm = LanguageModel::train(["stanford university", "stanford cardinal"]);
/// let uniform = UniformCostModel::default();
/// let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));
///
/// let correction = corrector.correct("Stanofrd university").unwrap();
/// assert_eq!("stanford university", correction.to_string());
/// ```
pub struct Corrector<'a> {
    lm: &'a LanguageModel,
    cost: EditCostModel<'a>,
    generator: CandidateGenerator<'a>,
    interpolation: f64,
}

impl<'a> Corrector<'a> {
    /// Creates a new corrector.
    ///
    /// # Arguments
    ///
    /// * `lm` - Language model giving `P(R)`.
    /// * `cost` - Edit-cost model giving `P(Q | R)`.
    pub const fn new(lm: &'a LanguageModel, cost: EditCostModel<'a>) -> Self {
        Self {
            lm,
            cost,
            generator: CandidateGenerator::new(lm, cost),
            interpolation: DEFAULT_SCORE_INTERPOLATION,
        }
    }

    /// Sets the weight of the unigram term when scoring candidate sequences.
    ///
    /// # Errors
    ///
    /// `lambda` must be in `[0, 1]`, otherwise [`QspellError::InvalidArgument`] is returned.
    pub fn interpolation(mut self, lambda: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&lambda) {
            return Err(QspellError::invalid_argument(
                "interpolation",
                format!("must be in [0, 1], but got {lambda}"),
            ));
        }
        self.interpolation = lambda;
        Ok(self)
    }

    /// Sets the number of alternatives kept per query word.
    pub fn max_alternatives(mut self, size: usize) -> Self {
        self.generator = self.generator.max_alternatives(size);
        self
    }

    /// Sets the number of alternatives kept per word for long queries.
    pub fn long_query_max_alternatives(mut self, size: usize) -> Self {
        self.generator = self.generator.long_query_max_alternatives(size);
        self
    }

    /// Computes `log P(R)` of a candidate.
    ///
    /// Bigram probabilities are interpolated again with the unigram probability of the second
    /// term, so a candidate pairing terms never seen together still gets a finite score.
    pub fn language_score(&self, candidate: &Candidate) -> f64 {
        let terms = candidate.terms();
        let Some((first, rest)) = terms.split_first() else {
            return 0.0;
        };
        let lambda = self.interpolation;
        let mut score = self.lm.unigram_log_prob(first);
        let mut prev = first;
        for term in rest {
            let p = lambda * self.lm.unigram_prob(term)
                + (1.0 - lambda) * self.lm.bigram_prob(prev, term);
            score += p.ln();
            prev = term;
        }
        score
    }

    /// Computes `log P(Q | R)` of a candidate, summed over its substitutions.
    ///
    /// # Errors
    ///
    /// If `table` has no distance for one of the substitutions,
    /// [`QspellError::MissingEditDistance`] is returned.
    pub fn edit_score(&self, candidate: &Candidate, table: &EditDistanceTable) -> Result<f64> {
        let mut score = 0.0;
        for s in candidate.substitutions() {
            let distance = table.distance(s.original(), s.replacement())?;
            score += self
                .cost
                .edit_probability(s.replacement(), s.original(), distance)
                .ln();
        }
        Ok(score)
    }

    /// Generates and scores every candidate of `query`, best first.
    ///
    /// # Errors
    ///
    /// Generation and scoring errors are returned as is.
    pub fn rank(&self, query: &str) -> Result<Vec<ScoredCandidate>> {
        let mut table = EditDistanceTable::new();
        let candidates = self.generator.generate(query, &mut table)?;
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let language_score = self.language_score(&candidate);
            let edit_score = self.edit_score(&candidate, &table)?;
            log::trace!("{candidate}: lm={language_score} edit={edit_score}");
            scored.push(ScoredCandidate {
                candidate,
                language_score,
                edit_score,
            });
        }
        rank_candidates(&mut scored);
        Ok(scored)
    }

    /// Gets the best correction of `query`.
    ///
    /// # Errors
    ///
    /// Generation and scoring errors are returned as is.
    pub fn correct(&self, query: &str) -> Result<Candidate> {
        let best = self
            .rank(query)?
            .into_iter()
            .next()
            .ok_or_else(|| QspellError::generation(query, "no candidate"))?;
        log::debug!("{query:?} -> {:?} ({})", best.candidate.to_string(), best.score());
        Ok(best.into_candidate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::candidate::Substitution;
    use crate::cost_model::{EmpiricalCostTrainer, UniformCostModel};

    fn correct_uniform(corpus: &[&str], query: &str) -> String {
        let lm = LanguageModel::train(corpus);
        let uniform = UniformCostModel::default();
        let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));
        corrector.correct(query).unwrap().to_string()
    }

    #[test]
    fn test_correct_exact_match() {
        assert_eq!("the cat sat", correct_uniform(&["the cat sat"], "the cat sat"));
    }

    #[test]
    fn test_correct_is_idempotent() {
        let corpus = ["the cat sat", "the dog ran", "a cat ran"];
        for query in corpus {
            assert_eq!(query, correct_uniform(&corpus, query));
        }
    }

    #[test]
    fn test_correct_transposition() {
        assert_eq!(
            "stanford university",
            correct_uniform(&["stanford university"], "stanofrd university")
        );
    }

    #[test]
    fn test_correct_distance2() {
        assert_eq!(
            "the quick brown fox",
            correct_uniform(&["the quick brown fox"], "the quick bruwm fox")
        );
    }

    #[test]
    fn test_correct_adjacency_fallback() {
        assert_eq!(
            "new york",
            correct_uniform(&["new york city", "new jersey"], "new xzqwv")
        );
    }

    #[test]
    fn test_correct_unknown_word_kept() {
        assert_eq!("zzz", correct_uniform(&["the cat sat"], "zzz"));
    }

    #[test]
    fn test_correct_empty_query() {
        assert_eq!("", correct_uniform(&["the cat sat"], ""));
    }

    #[test]
    fn test_correct_empirical() {
        let lm = LanguageModel::train(["stanford university"]);
        let mut trainer = EmpiricalCostTrainer::new();
        trainer.push_pair("ofr", "for").unwrap();
        let empirical = trainer.train();
        let corrector = Corrector::new(&lm, EditCostModel::Empirical(&empirical));

        let scored = corrector.rank("stanofrd university").unwrap();
        assert_eq!("stanford university", scored[0].candidate().to_string());
        let expected = 0.25f64.ln() + DEFAULT_SCORE_INTERPOLATION.ln();
        assert!((expected - scored[0].edit_score()).abs() < 1e-12);
    }

    #[test]
    fn test_rank_is_sorted() {
        let lm = LanguageModel::train(["the cat ran", "the hat ran"]);
        let uniform = UniformCostModel::default();
        let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));

        let scored = corrector.rank("the zat ran").unwrap();
        assert!(scored.len() > 1);
        for pair in scored.windows(2) {
            assert!(pair[0].score() >= pair[1].score());
        }
        // "cat" and "hat" tie; the lexically smaller one wins.
        assert_eq!("the cat ran", scored[0].candidate().to_string());
        assert_eq!("the hat ran", scored[1].candidate().to_string());
    }

    #[test]
    fn test_language_score() {
        let lm = LanguageModel::train(["new york", "new jersey"]);
        let uniform = UniformCostModel::default();
        let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));

        let candidate = Candidate::unchanged(["new", "york"]);
        let expected = lm.unigram_log_prob("new")
            + (0.95 * lm.unigram_prob("york") + 0.05 * lm.bigram_prob("new", "york")).ln();
        assert!((expected - corrector.language_score(&candidate)).abs() < 1e-12);

        let corrector = corrector.interpolation(0.0).unwrap();
        let expected = lm.unigram_log_prob("new") + lm.bigram_log_prob("new", "york");
        assert!((expected - corrector.language_score(&candidate)).abs() < 1e-12);

        assert_eq!(0.0, corrector.language_score(&Candidate::default()));
    }

    #[test]
    fn test_invalid_interpolation() {
        let lm = LanguageModel::train(["new york"]);
        let uniform = UniformCostModel::default();
        let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));

        assert!(corrector.interpolation(1.5).is_err());
    }

    #[test]
    fn test_edit_score_missing_distance() {
        let lm = LanguageModel::train(["the cat sat"]);
        let uniform = UniformCostModel::default();
        let corrector = Corrector::new(&lm, EditCostModel::Uniform(&uniform));

        let candidate = Candidate::new(vec![Substitution::new("cta", "cat", 1)]);
        let table = EditDistanceTable::new();
        assert!(matches!(
            corrector.edit_score(&candidate, &table),
            Err(QspellError::MissingEditDistance(_))
        ));
    }

    #[test]
    fn test_rank_candidates_ties() {
        let scored = |words: &[&str], distance: u32| ScoredCandidate {
            candidate: Candidate::new(
                words
                    .iter()
                    .map(|w| Substitution::new("x", *w, distance))
                    .collect(),
            ),
            language_score: -1.0,
            edit_score: -1.0,
        };
        let mut candidates = vec![
            scored(&["b"], 1),
            scored(&["a"], 2),
            scored(&["c"], 1),
        ];
        candidates.push(ScoredCandidate {
            language_score: f64::NEG_INFINITY,
            ..scored(&["a"], 0)
        });

        rank_candidates(&mut candidates);
        let order: Vec<String> = candidates
            .iter()
            .map(|c| c.candidate().to_string())
            .collect();
        assert_eq!(vec!["b", "c", "a", "a"], order);
        assert_eq!(0, candidates[3].candidate().total_distance());
    }
}
