use thiserror::Error;

/// Failure of a single request to the listen-data service.
///
/// `Network` and `Status` both mean the request itself failed; `Parse` means the
/// server answered but the body could not be decoded into track records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("malformed listen data: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Short text for the page's failure indicator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => String::from("the listen-data service could not be reached"),
            Self::Status(code) => format!("the listen-data service answered {code}"),
            Self::Parse(_) => String::from("the listen-data service sent data we couldn't read"),
        }
    }
}

impl From<ureq::Error> for FetchError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, _) => Self::Status(code),
            ureq::Error::Transport(transport) => Self::Network(transport.to_string()),
        }
    }
}
