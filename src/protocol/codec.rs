//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.

use std::io::{Read, Write};

use crate::error::{KvError, Result};
use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let payload = match command {
        Command::Get { key } | Command::Delete { key } => keyed_payload(key, &[]),
        Command::Put { key, value } | Command::Update { key, value } => keyed_payload(key, value),
        Command::Ping => Vec::new(),
    };
    frame(command.command_type() as u8, &payload)
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    match CommandType::try_from(cmd_type)? {
        CommandType::Get => {
            let (key, rest) = decode_key(payload, "GET")?;
            expect_empty(rest, "GET")?;
            Ok(Command::Get { key })
        }
        CommandType::Put => {
            let (key, value) = decode_key(payload, "PUT")?;
            Ok(Command::Put {
                key,
                value: value.to_vec(),
            })
        }
        CommandType::Delete => {
            let (key, rest) = decode_key(payload, "DELETE")?;
            expect_empty(rest, "DELETE")?;
            Ok(Command::Delete { key })
        }
        CommandType::Ping => {
            expect_empty(payload, "PING")?;
            Ok(Command::Ping)
        }
        CommandType::Update => {
            let (key, value) = decode_key(payload, "UPDATE")?;
            Ok(Command::Update {
                key,
                value: value.to_vec(),
            })
        }
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::NotFound,
        0x02 => Status::Error,
        _ => {
            return Err(KvError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Framing
// =============================================================================

fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(tag);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

fn keyed_payload(key: &str, value: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + key.len() + value.len());
    payload.extend_from_slice(&(key.len() as u32).to_be_bytes());
    payload.extend_from_slice(key.as_bytes());
    payload.extend_from_slice(value);
    payload
}

fn check_payload_len(len: usize, what: &str) -> Result<()> {
    if len > MAX_PAYLOAD_SIZE as usize {
        return Err(KvError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Split a frame into its tag byte and payload, validating lengths
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(KvError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

/// Decode `key_len (4) + key`, returning the key and the remaining bytes
fn decode_key<'a>(payload: &'a [u8], name: &str) -> Result<(String, &'a [u8])> {
    if payload.len() < 4 {
        return Err(KvError::Protocol(format!(
            "{} command: missing key length",
            name
        )));
    }

    let key_len = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
    let rest = &payload[4..];
    if rest.len() < key_len {
        return Err(KvError::Protocol(format!(
            "{} command: incomplete key (expected {}, got {})",
            name,
            key_len,
            rest.len()
        )));
    }

    let key = std::str::from_utf8(&rest[..key_len])
        .map_err(|e| KvError::Protocol(format!("{} command: key is not UTF-8: {}", name, e)))?
        .to_string();
    Ok((key, &rest[key_len..]))
}

fn expect_empty(rest: &[u8], name: &str) -> Result<()> {
    if !rest.is_empty() {
        return Err(KvError::Protocol(format!(
            "{} command: unexpected {} trailing bytes",
            name,
            rest.len()
        )));
    }
    Ok(())
}

/// Read one frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    check_payload_len(payload_len, "frame")?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    reader.read_exact(&mut message[HEADER_SIZE..])?;
    Ok(message)
}

impl TryFrom<u8> for CommandType {
    type Error = KvError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(CommandType::Get),
            0x02 => Ok(CommandType::Put),
            0x03 => Ok(CommandType::Delete),
            0x04 => Ok(CommandType::Ping),
            0x05 => Ok(CommandType::Update),
            _ => Err(KvError::Protocol(format!(
                "Unknown command type: 0x{:02x}",
                byte
            ))),
        }
    }
}
