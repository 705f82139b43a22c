use futures::future::LocalBoxFuture;

/// Why a world-model query produced no answer; the display text is shown to the user
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("Please enter a prompt.")]
    EmptyQuery,
    #[error("No images in the current project to prompt about.")]
    NoObjects,
    #[error("Error: API key is not set. Please set it in Settings.")]
    MissingCredential,
    #[error("Error: No internet connection. Please check your connection and try again.")]
    Offline,
    #[error("Error: Invalid API Key. Please check your API key in Settings.")]
    InvalidCredential,
    #[error("Error: API rate limit exceeded or quota finished. Please try again later.")]
    RateLimited,
    #[error("Error: API request failed ({status}). {message}")]
    RequestFailed { status: u16, message: String },
    #[error("Warning: Prompt was blocked by the API. Reason: {0}.")]
    Blocked(String),
    #[error("Warning: AI returned an empty or unexpected response.")]
    EmptyResponse,
    #[error("Error: Network issue. Could not connect to the AI service.")]
    Network,
    #[error("An unexpected error occurred: {0}.")]
    Other(String),
}

impl QueryError {
    /// The request went through but produced nothing usable
    pub fn is_warning(&self) -> bool {
        matches!(self, QueryError::Blocked(_) | QueryError::EmptyResponse)
    }
}

/// External assistant that answers a composed world-model prompt
pub trait QueryService {
    fn query<'a>(&'a self, prompt: &'a str) -> LocalBoxFuture<'a, Result<String, QueryError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            QueryError::Blocked("SAFETY".into()).to_string(),
            "Warning: Prompt was blocked by the API. Reason: SAFETY."
        );
        assert_eq!(
            QueryError::RequestFailed { status: 500, message: "HTTP Internal Server Error".into() }.to_string(),
            "Error: API request failed (500). HTTP Internal Server Error"
        );
        assert_eq!(QueryError::Other("boom".into()).to_string(), "An unexpected error occurred: boom.");
    }

    #[test]
    fn only_blocked_and_empty_are_warnings() {
        assert!(QueryError::EmptyResponse.is_warning());
        assert!(QueryError::Blocked("OTHER".into()).is_warning());
        assert!(!QueryError::RateLimited.is_warning());
        assert!(!QueryError::EmptyQuery.is_warning());
    }
}
