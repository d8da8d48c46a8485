use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Shape Error: {0}")]
    Shape(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Config Parse Error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}
