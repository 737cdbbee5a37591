use std::fmt;

/// The only failure category a probe run can produce. Anything that goes
/// wrong below the application layer (DNS, TCP connect, TLS, timeout, body
/// read) surfaces here; an HTTP response with a non-2xx status is not an
/// error, it is a result.
#[derive(Debug)]
pub enum ProbeError {
    Transport(reqwest::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::Transport(e) => write!(f, "transport failure: {}", e),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Transport(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> ProbeError {
        ProbeError::Transport(e)
    }
}
