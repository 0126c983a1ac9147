//! One-line share strings carrying a full parameter set.

use arbor_core::{GenerationParameters, MAX_ITERATIONS};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use thiserror::Error;

const SHARE_DOMAIN: &str = "arbor";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded payload.
pub(crate) const SHARE_HEADER: &str = "arbor:v1";
/// Delimiter used to separate the prefix and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding share strings.
#[derive(Debug, Error)]
pub(crate) enum ShareStringError {
    /// The provided string was empty or contained only whitespace.
    #[error("share string was empty")]
    EmptyPayload,
    /// The encoded string did not contain a version segment.
    #[error("share string is missing the version")]
    MissingVersion,
    /// The encoded string did not include the payload segment.
    #[error("share string is missing the payload")]
    MissingPayload,
    /// The encoded string used an unexpected prefix segment.
    #[error("share prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded string used an unsupported version identifier.
    #[error("share version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode share payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse share payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The decoded payload requested more rewrite passes than allowed.
    #[error(
        "share payload requests {0} iterations, at most {max} are supported",
        max = MAX_ITERATIONS
    )]
    TooManyIterations(u32),
    /// The parameters could not be serialised.
    #[error("could not serialise parameters")]
    Serialize(#[source] serde_json::Error),
}

/// Encodes `parameters` into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(parameters: &GenerationParameters) -> Result<String, ShareStringError> {
    let json = serde_json::to_vec(parameters).map_err(ShareStringError::Serialize)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{SHARE_HEADER}{FIELD_DELIMITER}{encoded}"))
}

/// Decodes parameters from a share string. Missing payload keys take their defaults.
pub(crate) fn decode(value: &str) -> Result<GenerationParameters, ShareStringError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ShareStringError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().unwrap_or_default();
    let version = parts.next().ok_or(ShareStringError::MissingVersion)?;
    let payload = parts.next().ok_or(ShareStringError::MissingPayload)?;

    if domain != SHARE_DOMAIN {
        return Err(ShareStringError::InvalidPrefix(domain.to_owned()));
    }
    if version != SHARE_VERSION {
        return Err(ShareStringError::UnsupportedVersion(version.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ShareStringError::InvalidEncoding)?;
    let parameters: GenerationParameters =
        serde_json::from_slice(&bytes).map_err(ShareStringError::InvalidPayload)?;
    if parameters.iterations > MAX_ITERATIONS {
        return Err(ShareStringError::TooManyIterations(parameters.iterations));
    }
    Ok(parameters)
}
