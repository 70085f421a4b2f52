//! Protocol Module
//!
//! Defines the wire protocol between the coordinator and storage nodes.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: GET    - Payload: key_len (4) + key
//! - 0x02: PUT    - Payload: key_len (4) + key + value
//! - 0x03: DEL    - Payload: key_len (4) + key
//! - 0x04: PING   - Payload: empty
//! - 0x05: UPDATE - Payload: key_len (4) + key + value
//!
//! Keys are UTF-8. Lengths are big-endian.
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK        - GET: value; PUT: created flag; UPDATE/DEL: existed flag
//! - 0x01: NOT_FOUND - GET on an absent key
//! - 0x02: ERROR     - Payload: UTF-8 message

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
