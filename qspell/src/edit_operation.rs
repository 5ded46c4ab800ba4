use std::fmt;

use bincode::{Decode, Encode};

/// Context character used in place of the character before the first one.
pub const WORD_START: char = '^';

/// A single-character edit that turns an intended string into an observed one.
///
/// Insertions and deletions carry the preceding character as context ([`WORD_START`] at the
/// beginning of a string).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub enum EditOperation {
    /// `deleted` was dropped after `prev`: intended `prev deleted`, typed `prev`.
    Deletion { prev: char, deleted: char },

    /// `inserted` was typed after `prev`: intended `prev`, typed `prev inserted`.
    Insertion { prev: char, inserted: char },

    /// `typed` was typed in place of `intended`.
    Substitution { typed: char, intended: char },

    /// Adjacent characters were swapped: intended `first second`, typed `second first`.
    Transposition { first: char, second: char },
}

impl EditOperation {
    /// Gets the characters on the intended side of the edit.
    ///
    /// This k-gram is the normalizer of the edit's empirical probability.
    pub fn intended_kgram(&self) -> String {
        match *self {
            Self::Deletion { prev, deleted } => [prev, deleted].iter().collect(),
            Self::Insertion { prev, .. } => prev.to_string(),
            Self::Substitution { intended, .. } => intended.to_string(),
            Self::Transposition { first, second } => [first, second].iter().collect(),
        }
    }

    /// Gets the characters on the typed side of the edit.
    pub fn typed_kgram(&self) -> String {
        match *self {
            Self::Deletion { prev, .. } => prev.to_string(),
            Self::Insertion { prev, inserted } => [prev, inserted].iter().collect(),
            Self::Substitution { typed, .. } => typed.to_string(),
            Self::Transposition { first, second } => [second, first].iter().collect(),
        }
    }

    /// Gets the name of the operation kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Deletion { .. } => "deletion",
            Self::Insertion { .. } => "insertion",
            Self::Substitution { .. } => "substitution",
            Self::Transposition { .. } => "transposition",
        }
    }
}

/// Formats as `typed|intended`, e.g. `e|i` for typing `e` instead of `i`.
impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}|{}", self.typed_kgram(), self.intended_kgram())
    }
}

/// Result of aligning an observed string with an intended one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Identical,
    Single(EditOperation),
    /// More than one edit separates the strings.
    Multiple,
}

/// Finds the single edit explaining how `intended` became `observed`.
///
/// The scan runs left to right. A length difference of one is checked as an insertion or
/// deletion at the first mismatch; equal lengths are checked as a transposition, then a
/// substitution. Anything else is [`Alignment::Multiple`].
///
/// # Examples
///
/// ```
/// use qspell::{align, Alignment, EditOperation};
///
/// assert_eq!(
///     Alignment::Single(EditOperation::Transposition { first: 'f', second: 'o' }),
///     align("stanofrd", "stanford"),
/// );
/// assert_eq!(Alignment::Multiple, align("stnofrd", "stanford"));
/// ```
pub fn align(observed: &str, intended: &str) -> Alignment {
    if observed == intended {
        return Alignment::Identical;
    }
    let o: Vec<char> = observed.chars().collect();
    let i: Vec<char> = intended.chars().collect();
    let p = o.iter().zip(&i).take_while(|(a, b)| a == b).count();
    let prev = |s: &[char]| if p == 0 { WORD_START } else { s[p - 1] };

    let op = if o.len() + 1 == i.len() {
        (o[p..] == i[p + 1..]).then(|| EditOperation::Deletion {
            prev: prev(&i[..]),
            deleted: i[p],
        })
    } else if o.len() == i.len() + 1 {
        (o[p + 1..] == i[p..]).then(|| EditOperation::Insertion {
            prev: prev(&o[..]),
            inserted: o[p],
        })
    } else if o.len() == i.len() {
        if p + 1 < o.len() && o[p] == i[p + 1] && o[p + 1] == i[p] && o[p + 2..] == i[p + 2..] {
            Some(EditOperation::Transposition {
                first: i[p],
                second: i[p + 1],
            })
        } else {
            (o[p + 1..] == i[p + 1..]).then(|| EditOperation::Substitution {
                typed: o[p],
                intended: i[p],
            })
        }
    } else {
        None
    };

    op.map_or(Alignment::Multiple, Alignment::Single)
}
