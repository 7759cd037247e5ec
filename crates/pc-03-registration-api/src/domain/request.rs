//! Registration request parsing
//!
//! Body: `{"pkc": <consumer id>, "serializedPkc": <public key material>}`.
//! Both fields must be present, non-empty strings.

use pc_02_epoch_aggregation::Consumer;
use serde_json::Value;

use crate::error::RegistrationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Register,
    Unregister,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Unregister => "unregister",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Register => "Public key (pkc) of consumer added to be registered",
            Self::Unregister => "Public key (pkc) of consumer added to be unregistered",
        }
    }

    fn missing_field_message(&self) -> &'static str {
        match self {
            Self::Register => "Public key (pkc or serializedPkc) of consumer not found",
            Self::Unregister => "Public key (pkc) of consumer not found",
        }
    }
}

/// Parse and validate a raw request body into the consumer it names
///
/// Bytes that are not valid UTF-8 JSON are a `MalformedRequest` like any
/// other unparseable body.
pub fn parse_consumer(operation: Operation, body: &[u8]) -> Result<Consumer, RegistrationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RegistrationError::MalformedRequest(format!("Invalid JSON body: {e}")))?;

    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match (field("pkc"), field("serializedPkc")) {
        (Some(id), Some(public_key)) => Ok(Consumer::new(id, public_key)),
        _ => Err(RegistrationError::MalformedRequest(
            operation.missing_field_message().to_string(),
        )),
    }
}
