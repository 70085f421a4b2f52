//! Client
//!
//! Blocking client for one storage node.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_command, Command, Response, Status};

/// Connection to a single storage node
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    addr: String,
}

impl Client {
    /// Connect to `addr`, giving up after `timeout`
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| KvError::Network(format!("cannot resolve {}: {}", addr, e)))?
            .next()
            .ok_or_else(|| KvError::Network(format!("no address for {}", addr)))?;

        let stream = TcpStream::connect_timeout(&socket_addr, timeout)
            .map_err(|e| KvError::Network(format!("cannot connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            addr: addr.to_string(),
        })
    }

    /// Send a command and wait for its response
    pub fn execute(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self.execute(&Command::Get {
            key: key.to_string(),
        })?;
        match response.status {
            Status::Ok => Ok(Some(response.payload.unwrap_or_default())),
            Status::NotFound => Ok(None),
            Status::Error => Err(remote_error(&response)),
        }
    }

    /// Returns whether the key was created
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        self.mutation(Command::Put {
            key: key.to_string(),
            value: value.to_vec(),
        })
    }

    /// Returns whether the key existed
    pub fn update(&mut self, key: &str, value: &[u8]) -> Result<bool> {
        self.mutation(Command::Update {
            key: key.to_string(),
            value: value.to_vec(),
        })
    }

    /// Returns whether the key existed
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.mutation(Command::Delete {
            key: key.to_string(),
        })
    }

    pub fn ping(&mut self) -> Result<()> {
        let response = self.execute(&Command::Ping)?;
        match response.status {
            Status::Ok => Ok(()),
            _ => Err(remote_error(&response)),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn mutation(&mut self, command: Command) -> Result<bool> {
        let response = self.execute(&command)?;
        response.as_flag().ok_or_else(|| remote_error(&response))
    }
}

fn remote_error(response: &Response) -> KvError {
    match response.error_message() {
        Some(message) => KvError::Remote(message),
        None => KvError::Protocol(format!("unexpected response: {:?}", response)),
    }
}
