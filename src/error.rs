use std::fmt::{self, Display, Formatter};

/// All failure modes of the client. Transport problems, rejected logins,
/// expired sessions, unexpected markup and unconfirmed submissions are kept
/// apart so callers can tell "site unreachable" from "site changed".
#[derive(Debug)]
pub enum Error {
    Network(reqwest::Error),
    Authentication(String),
    SessionExpired(String),
    Scrape(String),
    Submit(String),
}

impl Error {
    pub(crate) fn authentication(msg: &str) -> Self {
        Self::Authentication(msg.to_string())
    }

    pub(crate) fn session_expired(msg: &str) -> Self {
        Self::SessionExpired(msg.to_string())
    }

    pub(crate) fn scrape(msg: &str) -> Self {
        Self::Scrape(msg.to_string())
    }

    pub(crate) fn submit(msg: &str) -> Self {
        Self::Submit(msg.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {e}"),
            Self::Authentication(msg) => write!(f, "Authentication error: {msg}"),
            Self::SessionExpired(msg) => write!(f, "Session expired: {msg}"),
            Self::Scrape(msg) => write!(f, "Scrape error: {msg}"),
            Self::Submit(msg) => write!(f, "Submit error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
