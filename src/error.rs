use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid config: {field} = {value} (expected a finite value in [0, 1])")]
    InvalidConfig { field: &'static str, value: f64 },

    #[error("pixel buffer holds {actual} bytes, expected {expected} for the given dimensions")]
    BufferSize { expected: usize, actual: usize },

    #[error("unknown {kind} `{value}`")]
    UnknownVariant { kind: &'static str, value: String },

    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
