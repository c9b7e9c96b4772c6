use haulplan_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ClientError::Timeout
        } else if error.is_decode() {
            ClientError::Decode(error.to_string())
        } else {
            ClientError::Transport(error)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        ClientError::Decode(error.to_string())
    }
}

impl From<ClientError> for ApiError {
    fn from(error: ClientError) -> Self {
        match &error {
            ClientError::Timeout => ApiError::timeout("The server took too long to respond."),
            ClientError::Transport(_) => ApiError::network(error.to_string()),
            ClientError::Status { status: 404, .. } => ApiError::not_found(error.to_string()),
            ClientError::Status { status, .. } if (400..500).contains(status) => {
                ApiError::invalid_argument(error.to_string())
            }
            ClientError::Status { .. } | ClientError::Decode(_) | ClientError::InvalidUrl(_) => {
                ApiError::internal(error.to_string())
            }
        }
    }
}
