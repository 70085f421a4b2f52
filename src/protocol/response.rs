//! Response definitions
//!
//! Represents responses from a storage node.

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

/// A response to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (value for GET, flag for mutations, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// OK response carrying a created/existed flag
    pub fn flag(value: bool) -> Self {
        Self::ok(Some(vec![u8::from(value)]))
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Read the flag of a mutation response
    pub fn as_flag(&self) -> Option<bool> {
        match (self.status, self.payload.as_deref()) {
            (Status::Ok, Some([b])) => Some(*b != 0),
            _ => None,
        }
    }

    /// Error message of an ERROR response
    pub fn error_message(&self) -> Option<String> {
        match self.status {
            Status::Error => Some(
                self.payload
                    .as_deref()
                    .map(|p| String::from_utf8_lossy(p).into_owned())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }
}
