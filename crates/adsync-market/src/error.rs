use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketplaceError {
    #[error("Marketplace API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("Marketplace transport error: {0}")]
    Transport(String),

    #[error("Invalid marketplace response: {0}")]
    Decode(String),

    #[error("Marketplace request timed out")]
    Timeout,

    #[error("Invalid marketplace configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for MarketplaceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketplaceError>;
