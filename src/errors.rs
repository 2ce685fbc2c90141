use std::fmt;

use thiserror::Error;

/// Pipeline stage, carried in every transport and protocol error so callers
/// can tell which exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Authorization code → Microsoft access token
    MsTokenExchange,
    /// Microsoft access token → Xbox Live token + user hash
    XblAuthenticate,
    /// Xbox Live token → XSTS token
    XstsAuthorize,
    /// XSTS token + user hash → Minecraft access token
    McLogin,
    /// Game-ownership check against the entitlement endpoint
    Entitlements,
    /// Profile fetch with the Minecraft access token
    Profile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::MsTokenExchange => "Microsoft token exchange",
            Stage::XblAuthenticate => "Xbox Live authentication",
            Stage::XstsAuthorize => "XSTS authorization",
            Stage::McLogin => "Minecraft Services login",
            Stage::Entitlements => "entitlement check",
            Stage::Profile => "profile fetch",
        };
        f.write_str(name)
    }
}

/// Authentication error types
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("network error during {stage}: {source}")]
    Network {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} during {stage}: {body_snippet}")]
    Http {
        stage: Stage,
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("invalid response from {stage}: {message}")]
    InvalidResponse { stage: Stage, message: String },

    #[error("XSTS authorization denied: {0}")]
    XstsDenied(#[from] XstsError),

    #[error("Minecraft profile not found - the account has no profile yet")]
    ProfileNotFound,

    #[error("offline username must not be empty")]
    EmptyUsername,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl AuthError {
    pub(crate) fn network(stage: Stage, source: reqwest::Error) -> Self {
        Self::Network { stage, source }
    }

    pub(crate) fn invalid_response(stage: Stage, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            stage,
            message: message.into(),
        }
    }

    /// The stage at which this error occurred, if it happened inside the
    /// exchange pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Network { stage, .. }
            | Self::Http { stage, .. }
            | Self::InvalidResponse { stage, .. } => Some(*stage),
            Self::XstsDenied(_) => Some(Stage::XstsAuthorize),
            _ => None,
        }
    }
}

/// XSTS-specific error codes from the XErr field of a 401 response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XstsError {
    #[error("account doesn't have an Xbox account (XErr: 2148916233)")]
    NoXboxAccount,

    #[error("Xbox Live not available in this country (XErr: 2148916235)")]
    RegionNotSupported,

    #[error("adult verification required on Xbox page (XErr: 2148916236/2148916237)")]
    AdultVerificationRequired,

    #[error("child account requires Family (XErr: 2148916238)")]
    ChildAccountRequiresFamily,

    #[error("unknown XSTS error code: {0}")]
    Unknown(u64),
}

impl XstsError {
    /// Parse XErr code from an XSTS error response
    pub fn from_xerr(code: u64) -> Self {
        match code {
            2148916233 => Self::NoXboxAccount,
            2148916235 => Self::RegionNotSupported,
            2148916236 | 2148916237 => Self::AdultVerificationRequired,
            2148916238 => Self::ChildAccountRequiresFamily,
            code => Self::Unknown(code),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xerr_mapping() {
        assert_eq!(XstsError::from_xerr(2148916233), XstsError::NoXboxAccount);
        assert_eq!(
            XstsError::from_xerr(2148916236),
            XstsError::AdultVerificationRequired
        );
        assert_eq!(XstsError::from_xerr(42), XstsError::Unknown(42));
    }

    #[test]
    fn test_stage_accessor() {
        let err = AuthError::invalid_response(Stage::McLogin, "missing access_token");
        assert_eq!(err.stage(), Some(Stage::McLogin));
        assert_eq!(AuthError::EmptyUsername.stage(), None);
        assert_eq!(
            AuthError::XstsDenied(XstsError::NoXboxAccount).stage(),
            Some(Stage::XstsAuthorize)
        );
    }

    #[test]
    fn test_error_message_names_stage() {
        let err = AuthError::invalid_response(Stage::XblAuthenticate, "missing XUI claims");
        assert!(err.to_string().contains("Xbox Live authentication"));
    }
}
