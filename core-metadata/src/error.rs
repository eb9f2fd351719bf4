use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract metadata: {0}")]
    ExtractionFailed(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Invalid naming configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
