//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::{ClientId, Engine};
use crate::error::{KatError, Result};
use crate::protocol::{encode, Value};
use super::Connection;

/// How often the accept loop checks the shutdown flag when idle
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// TCP server for katredis
pub struct Server {
    config: Config,

    engine: Arc<Engine>,

    /// Non-blocking listener so the loop can observe `shutdown`
    listener: TcpListener,

    shutdown: Arc<AtomicBool>,

    /// Live connections, kept so shutdown can unblock their reads
    connections: Arc<Mutex<HashMap<ClientId, TcpStream>>>,

    active: Arc<AtomicUsize>,
}

impl Server {
    /// Bind the listen address from the config
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            KatError::Network(format!("cannot listen on {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        let local_addr = listener.local_addr()?;
        engine.set_tcp_port(local_addr.port());
        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The bound address (useful when listening on port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` when set; hand this to a signal handler
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        let wait_group = WaitGroup::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => self.accept(stream, addr, wait_group.clone()),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                    self.close_connections();
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            "Shutting down, closing {} connection(s)",
            self.active.load(Ordering::SeqCst)
        );
        self.close_connections();
        wait_group.wait();
        Ok(())
    }

    fn accept(&self, mut stream: TcpStream, addr: SocketAddr, wait_group: WaitGroup) {
        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!("Rejecting {}: max connections reached", addr);
            if let Ok(reply) = encode(&Value::error("ERR max number of clients reached")) {
                let _ = stream.write_all(&reply);
            }
            return;
        }

        // Some platforms hand out sockets that inherit the listener's mode
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Cannot configure socket for {}: {}", addr, e);
            return;
        }

        let registry_handle = match stream.try_clone() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("Cannot clone socket for {}: {}", addr, e);
                return;
            }
        };

        let mut connection =
            match Connection::new(stream, Arc::clone(&self.engine), self.config.codec) {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("Cannot set up connection for {}: {}", addr, e);
                    return;
                }
            };
        if let Err(e) =
            connection.set_timeouts(self.config.read_timeout_ms, self.config.write_timeout_ms)
        {
            tracing::warn!("Cannot set timeouts for {}: {}", addr, e);
        }

        let id = connection.client_id();
        self.connections.lock().insert(id, registry_handle);
        self.active.fetch_add(1, Ordering::SeqCst);

        let connections = Arc::clone(&self.connections);
        let active = Arc::clone(&self.active);
        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                if let Err(e) = connection.handle() {
                    tracing::debug!("Connection {} closed with error: {}", id, e);
                }
                drop(connection);
                connections.lock().remove(&id);
                active.fetch_sub(1, Ordering::SeqCst);
                drop(wait_group);
            });

        if let Err(e) = spawned {
            tracing::error!("Cannot spawn thread for {}: {}", addr, e);
            self.connections.lock().remove(&id);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Shut down every live socket so blocked reads return
    fn close_connections(&self) {
        for (_, stream) in self.connections.lock().iter() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}
