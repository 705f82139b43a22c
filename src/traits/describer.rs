use futures::future::LocalBoxFuture;

use crate::types::PlaneId;

/// One image handed to a description service
#[derive(Debug, Clone, Copy)]
pub struct DescribeRequest<'a> {
    pub plane: &'a PlaneId,
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// Per-image failure; the display text is what lands in the plane's description
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescribeError {
    #[error("Error: Invalid image data format.")]
    InvalidImageData,
    #[error("Error: Invalid MIME type ({0}).")]
    InvalidMimeType(String),
    #[error("Error: Invalid API key. Please check the configured credential.")]
    InvalidCredential,
    #[error("Error: API rate limit exceeded or quota finished. Please try again later.")]
    RateLimited,
    #[error("Error: Description service error ({0}). Please try again later.")]
    Server(u16),
    #[error("Error: API Bad Request - {0}. Please check image data or prompt.")]
    BadRequest(String),
    #[error("Error: Network issue. Could not connect to the description service.")]
    Network,
    #[error("Warning: Processing blocked {}.", friendly_block_reason(.0))]
    Blocked(String),
    #[error("Warning: No description text returned. The response might be empty or in an unexpected format.")]
    EmptyResponse,
    #[error("Error: {0}")]
    Other(String),
}

fn friendly_block_reason(reason: &str) -> String {
    match reason {
        "SAFETY" => "due to safety concerns".to_string(),
        "OTHER" => "for an unspecified reason".to_string(),
        other => format!("({other})"),
    }
}

impl DescribeError {
    /// Warnings are recorded like errors but do not count as failures
    pub fn is_warning(&self) -> bool {
        matches!(self, DescribeError::Blocked(_) | DescribeError::EmptyResponse)
    }
}

/// External service that turns an image into descriptive text
pub trait DescriptionService {
    fn describe<'a>(&'a self, request: DescribeRequest<'a>) -> LocalBoxFuture<'a, Result<String, DescribeError>>;
}
