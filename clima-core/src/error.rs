//! Error taxonomy shared by the source adapter and the orchestrator.
//!
//! Every variant carries a message meant for end users; `Display` prints
//! only that message and never the upstream body.

use thiserror::Error;

pub(crate) const MSG_INVALID_KEY: &str = "API Key inválida. Verifica tu configuración.";
pub(crate) const MSG_RATE_LIMITED: &str = "Límite de peticiones excedido. Intenta más tarde.";
pub(crate) const MSG_NETWORK: &str = "Error de conexión. Verifica tu internet.";
pub(crate) const MSG_UPSTREAM: &str = "Error al obtener datos del clima";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    /// No location or city matched (HTTP 404 or empty geocoding result).
    #[error("{0}")]
    NotFound(String),

    /// Credential rejected (HTTP 401).
    #[error("{0}")]
    Auth(String),

    /// HTTP 429.
    #[error("{0}")]
    RateLimited(String),

    /// Any other non-2xx status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    /// Malformed or unexpected payload shape.
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl WeatherError {
    /// Prefix the message, keeping the error kind.
    pub fn wrap(self, prefix: &str) -> Self {
        let wrap = |msg: String| format!("{prefix}: {msg}");
        match self {
            Self::NotFound(m) => Self::NotFound(wrap(m)),
            Self::Auth(m) => Self::Auth(wrap(m)),
            Self::RateLimited(m) => Self::RateLimited(wrap(m)),
            Self::Upstream { status, message } => Self::Upstream { status, message: wrap(message) },
            Self::Network(m) => Self::Network(wrap(m)),
            Self::Parse(m) => Self::Parse(wrap(m)),
            Self::InvalidInput(m) => Self::InvalidInput(wrap(m)),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Auth(_) => "auth",
            Self::RateLimited(_) => "rate_limited",
            Self::Upstream { .. } => "upstream",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::InvalidInput(_) => "invalid_input",
        }
    }

    /// Whether trying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::debug!("Failed to decode upstream body: {err}");
            Self::Parse(format!("Respuesta del servicio de clima no válida: {err}"))
        } else {
            tracing::warn!("Transport failure talking to upstream: {err}");
            Self::Network(MSG_NETWORK.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("Respuesta del servicio de clima no válida: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_kind_and_prefixes_message() {
        let err = WeatherError::NotFound("Ciudad \"Xyzzyville\" no encontrada".into())
            .wrap("Error en geocoding");

        assert!(matches!(err, WeatherError::NotFound(_)));
        assert_eq!(err.to_string(), "Error en geocoding: Ciudad \"Xyzzyville\" no encontrada");
    }

    #[test]
    fn wrap_keeps_upstream_status() {
        let err = WeatherError::Upstream { status: 500, message: "boom".into() }.wrap("ctx");
        assert_eq!(err, WeatherError::Upstream { status: 500, message: "ctx: boom".into() });
    }

    #[test]
    fn retryable_kinds() {
        assert!(WeatherError::RateLimited(MSG_RATE_LIMITED.into()).is_retryable());
        assert!(WeatherError::Network(MSG_NETWORK.into()).is_retryable());
        assert!(!WeatherError::Auth(MSG_INVALID_KEY.into()).is_retryable());
        assert!(!WeatherError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn json_errors_become_parse_errors() {
        let err: WeatherError = serde_json::from_str::<Vec<u8>>("{").unwrap_err().into();
        assert_eq!(err.kind(), "parse");
    }
}
