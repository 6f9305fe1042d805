//! All errors that can occur in the treemut library.

use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum TreemutError {
    /// The arena or an output table could not grow, or rejection sampling
    /// ran out of retries on a saturated interval.
    ResourceExhausted(String),
    /// Invalid settings or a malformed genealogy detected at construction.
    InvalidConfiguration(String),
    /// Node or sample identifier outside the table bounds.
    OutOfBounds(String),
    /// The mutation table carries more than one state transition per site.
    UnsupportedMutations(String),
    /// The same sample received the same mutation column twice.
    InconsistentMutation { sample: u32, column: usize },
}

pub type Result<T> = std::result::Result<T, TreemutError>;

impl fmt::Display for TreemutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TreemutError::ResourceExhausted(message) => {
                write!(f, "ResourceExhausted: {}", message)
            }
            TreemutError::InvalidConfiguration(message) => {
                write!(f, "InvalidConfiguration: {}", message)
            }
            TreemutError::OutOfBounds(message) => {
                write!(f, "OutOfBounds: {}", message)
            }
            TreemutError::UnsupportedMutations(message) => {
                write!(f, "UnsupportedMutations: {}", message)
            }
            TreemutError::InconsistentMutation { sample, column } => {
                write!(
                    f,
                    "InconsistentMutation: bit already set for sample {} at column {}",
                    sample, column
                )
            }
        }
    }
}

impl std::error::Error for TreemutError {}
