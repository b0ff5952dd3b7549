use thiserror::Error;

/// Unified error type for Courier.
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Log not found")]
    LogNotFound,

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Invalid page.")]
    InvalidPage,

    #[error("Authentication credentials were not provided.")]
    Unauthorized,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl CourierError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CourierError::LogNotFound => 404,
            CourierError::InvalidQuery(_) => 400,
            CourierError::InvalidPage => 400,
            CourierError::Unauthorized => 401,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(CourierError::LogNotFound.status_code(), 404);
        assert_eq!(CourierError::InvalidPage.status_code(), 400);
        assert_eq!(CourierError::InvalidQuery("bad".into()).status_code(), 400);
        assert_eq!(CourierError::Unauthorized.status_code(), 401);
    }

    #[test]
    fn store_errors_map_to_500() {
        assert_eq!(CourierError::Store("disk full".into()).status_code(), 500);
        assert_eq!(CourierError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn invalid_query_displays_bare_message() {
        let err = CourierError::InvalidQuery("status_code: Enter a number.".into());
        assert_eq!(err.to_string(), "status_code: Enter a number.");
    }
}
