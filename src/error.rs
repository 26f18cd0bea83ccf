use reqwest::StatusCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Invalid(String),

    #[error("You must log in first")]
    NotSignedIn,

    #[error("Only chat admins can do that")]
    NotChatAdmin,

    #[error("Session expired, please sign in again")]
    Unauthorized,

    /// Message returned by the server, shown verbatim.
    #[error("{0}")]
    Server(String),

    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("Server is unreachable: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::Invalid(reason.into())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized)
    }

    /// A 401 only means an expired session when a bearer token was sent;
    /// on anonymous calls it carries the server's own message.
    pub(crate) fn from_status(status: StatusCode, message: Option<String>, authenticated: bool) -> Self {
        if status == StatusCode::UNAUTHORIZED && authenticated {
            return Error::Unauthorized;
        }
        match message {
            Some(message) if !message.trim().is_empty() => Error::Server(message),
            _ => Error::Status(status.as_u16()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Error::from_status(status, None, true)
        } else {
            Error::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::from_status(StatusCode::UNAUTHORIZED, Some("jwt expired".into()), true),
            Error::Unauthorized
        );
        assert_eq!(
            Error::from_status(StatusCode::UNAUTHORIZED, Some("Invalid credentials".into()), false),
            Error::Server("Invalid credentials".into())
        );
        assert_eq!(
            Error::from_status(StatusCode::UNAUTHORIZED, None, false),
            Error::Status(401)
        );
        assert_eq!(
            Error::from_status(StatusCode::FORBIDDEN, Some("Not your post".into()), true),
            Error::Server("Not your post".into())
        );
        assert_eq!(
            Error::from_status(StatusCode::BAD_GATEWAY, Some("  ".into()), true),
            Error::Status(502)
        );
        assert_eq!(Error::from_status(StatusCode::NOT_FOUND, None, true), Error::Status(404));
    }

    #[test]
    fn server_messages_are_verbatim() {
        let err = Error::Server("Пользователь уже существует".into());
        assert_eq!(err.to_string(), "Пользователь уже существует");
    }
}
