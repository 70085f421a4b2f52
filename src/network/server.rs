//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::node::StorageNode;
use crate::protocol::{write_response, Response};

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for a storage node
pub struct Server {
    config: Config,
    node: Arc<StorageNode>,
    listener: TcpListener,
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    active: Arc<AtomicUsize>,
}

/// Stops a running server's accept loop from another thread
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Server {
    /// Bind the listen address from `config`
    ///
    /// A bind failure is fatal to the server and returned to the caller.
    pub fn bind(config: Config, node: Arc<StorageNode>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            KvError::Network(format!("cannot bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            config,
            node,
            listener,
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Accept connections until shut down (blocking)
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr);

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        tracing::info!("Server on {} stopped accepting", self.local_addr);
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping connection from {}: {}", peer, e);
            return;
        }

        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: connection limit reached", peer);
            let mut stream = stream;
            let _ = write_response(&mut stream, &Response::error("too many connections"));
            return;
        }

        let mut connection = match Connection::new(stream, Arc::clone(&self.node)) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Dropping connection from {}: {}", peer, e);
                return;
            }
        };
        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            tracing::warn!("Cannot set timeouts for {}: {}", peer, e);
        }

        let active = Arc::clone(&self.active);
        active.fetch_add(1, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name(format!("ringkv-conn-{}", peer))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} ended with error: {}", connection.peer_addr(), e);
                }
                active.fetch_sub(1, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            self.active.fetch_sub(1, Ordering::SeqCst);
            tracing::error!("Cannot spawn handler for {}: {}", peer, e);
        }
    }
}
