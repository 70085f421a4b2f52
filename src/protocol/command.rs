//! Command definitions
//!
//! Represents requests sent to a storage node.

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Get = 0x01,
    Put = 0x02,
    Delete = 0x03,
    Ping = 0x04,
    Update = 0x05,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key
    Get { key: String },

    /// Insert or overwrite a key
    Put { key: String, value: Vec<u8> },

    /// Overwrite an existing key
    Update { key: String, value: Vec<u8> },

    /// Delete a key
    Delete { key: String },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Get { .. } => CommandType::Get,
            Command::Put { .. } => CommandType::Put,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
            Command::Ping => CommandType::Ping,
        }
    }

    /// The key this command addresses, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Command::Get { key }
            | Command::Put { key, .. }
            | Command::Update { key, .. }
            | Command::Delete { key } => Some(key),
            Command::Ping => None,
        }
    }
}
