//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = QspellError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum QspellError {
    InvalidModel(InvalidModelError),
    InvalidArgument(InvalidArgumentError),
    Generation(GenerationError),
    MissingEditDistance(MissingEditDistanceError),
    MalformedPair(MalformedPairError),
    DecodeError(bincode::error::DecodeError),
    EncodeError(bincode::error::EncodeError),
    IOError(std::io::Error),
}

impl QspellError {
    pub(crate) fn invalid_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidModel(InvalidModelError { msg: msg.into() })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn generation<Q, S>(query: Q, msg: S) -> Self
    where
        Q: Into<String>,
        S: Into<String>,
    {
        Self::Generation(GenerationError {
            query: query.into(),
            msg: msg.into(),
        })
    }

    pub(crate) fn missing_edit_distance<F, T>(from: F, to: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        Self::MissingEditDistance(MissingEditDistanceError {
            from: from.into(),
            to: to.into(),
        })
    }

    pub(crate) fn malformed_pair<N, C>(noisy: N, clean: C) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self::MalformedPair(MalformedPairError {
            noisy: noisy.into(),
            clean: clean.into(),
        })
    }
}

impl fmt::Display for QspellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidModel(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
            Self::Generation(e) => e.fmt(f),
            Self::MissingEditDistance(e) => e.fmt(f),
            Self::MalformedPair(e) => e.fmt(f),
            Self::DecodeError(e) => e.fmt(f),
            Self::EncodeError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for QspellError {}

/// Error used when the model is invalid.
#[derive(Debug)]
pub struct InvalidModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when candidate generation breaks one of its own guarantees.
///
/// This never happens for a well-formed language model; seeing it means the
/// generator has a defect.
#[derive(Debug)]
pub struct GenerationError {
    /// The query being corrected.
    pub(crate) query: String,

    /// Error message.
    pub(crate) msg: String,
}

impl GenerationError {
    /// Gets the query that triggered the error.
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GenerationError: {:?}: {}", self.query, self.msg)
    }
}

impl Error for GenerationError {}

/// Error used when the scorer asks for an edit distance the generator never recorded.
#[derive(Debug)]
pub struct MissingEditDistanceError {
    pub(crate) from: String,
    pub(crate) to: String,
}

impl fmt::Display for MissingEditDistanceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MissingEditDistanceError: no distance recorded from {:?} to {:?}",
            self.from, self.to
        )
    }
}

impl Error for MissingEditDistanceError {}

/// Error used when a noisy/clean training pair is not explained by a single edit.
#[derive(Debug)]
pub struct MalformedPairError {
    pub(crate) noisy: String,
    pub(crate) clean: String,
}

impl fmt::Display for MalformedPairError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MalformedPairError: {:?} -> {:?} differs by more than one edit",
            self.noisy, self.clean
        )
    }
}

impl Error for MalformedPairError {}

impl From<bincode::error::DecodeError> for QspellError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::DecodeError(error)
    }
}

impl From<bincode::error::EncodeError> for QspellError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::EncodeError(error)
    }
}

impl From<std::io::Error> for QspellError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
