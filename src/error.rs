use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrillError {
    #[error("training list `{0}` has no categories")]
    EmptyList(String),

    #[error("category `{category}` in training list `{list}` has no subjects")]
    EmptyCategory { list: String, category: String },

    #[error("unknown algorithm `{0}` (expected one of: balanced, struggling-focus, fresh-exploration, spaced-repetition, random)")]
    UnknownAlgorithm(String),

    #[error("unknown rating `{0}` (expected easy, got-it, struggled or failed)")]
    UnknownRating(String),

    #[error("unknown training list `{0}`")]
    UnknownList(String),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DrillError>;
