use base64::Engine;
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::scan::classifier::URL_SAFE_LENIENT;

/// Claims (middle) segment of a compact JWT, without checking the signature
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, DecodeError> {
    let mut segments = token.trim().split('.');

    let (Some(_header), Some(claims), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DecodeError::InvalidFormat(
            "JWT must have exactly three segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_LENIENT
        .decode(claims)
        .map_err(|e| DecodeError::InvalidFormat(format!("JWT claims are not Base64: {}", e)))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DecodeError::InvalidFormat(
            "JWT claims are not a JSON object".to_string(),
        )),
        Err(e) => Err(DecodeError::InvalidFormat(format!(
            "JWT claims are not JSON: {}",
            e
        ))),
    }
}
