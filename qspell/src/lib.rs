#![cfg_attr(docsrs, feature(doc_cfg))]

//! # qspell
//!
//! qspell corrects misspelled search queries with a noisy-channel model: for an observed query
//! `Q` it picks the correction `R` maximizing `P(R)·P(Q | R)`, where `P(R)` comes from a
//! unigram/bigram language model and `P(Q | R)` from an edit-cost model.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{prelude::*, stdin, BufReader};
//!
//! use qspell::{CostModelKind, Corrector, Model};
//!
//! let mut f = BufReader::new(File::open("model.bin").unwrap());
//! let model = Model::read(&mut f).unwrap();
//! let corrector = Corrector::new(
//!     model.language_model(),
//!     model.cost_model(CostModelKind::Empirical),
//! );
//!
//! for line in stdin().lock().lines() {
//!     let correction = corrector.correct(&line.unwrap()).unwrap();
//!     println!("{}", correction);
//! }
//! ```
//!
//! Models are built with [`LanguageModelTrainer`] and [`EmpiricalCostTrainer`].

mod candidate;
mod corrector;
mod cost_model;
mod dictionary;
mod edit_operation;
mod generator;
mod language_model;
mod model;
mod utils;

pub mod errors;

pub use candidate::{cartesian_product, Candidate, EditDistanceTable, Substitution};
pub use corrector::{rank_candidates, Corrector, ScoredCandidate, DEFAULT_SCORE_INTERPOLATION};
pub use cost_model::{
    CostModelKind, EditCostModel, EmpiricalCostModel, EmpiricalCostTrainer, UniformCostModel,
    UNIFORM_EDIT_PROBABILITY, ZERO_EDIT_PROBABILITY,
};
pub use dictionary::Dictionary;
pub use edit_operation::{align, Alignment, EditOperation, WORD_START};
pub use generator::{
    edits1, rank_alternatives, CandidateGenerator, ALPHABET, DEFAULT_LONG_QUERY_MAX_ALTERNATIVES,
    DEFAULT_MAX_ALTERNATIVES, LONG_QUERY_WORDS,
};
pub use language_model::{LanguageModel, LanguageModelTrainer, DEFAULT_LM_INTERPOLATION};
pub use model::{Model, NoisyChannelModel, MODEL_MAGIC};
pub use utils::{edit_distance, tokenize};
