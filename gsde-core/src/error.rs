use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdeError {
    /// A probability query was made before the distribution was built for this step.
    #[error("{operation} called before the distribution was built")]
    Precondition { operation: &'static str },

    #[error("shape mismatch for {what}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// The epsilon floor could not keep a variance or std finite.
    #[error("non-finite {what} after applying the epsilon floor")]
    NumericGuard { what: &'static str },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SdeError>;

impl SdeError {
    pub fn shape_mismatch(what: &'static str, expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}
