//! Engine Module
//!
//! Executes parsed commands and produces reply values.
//!
//! ## Responsibilities
//! - Resolve a request array to a [`Command`] and run it
//! - Track connected clients (id, address, name)
//! - Keep server statistics for `INFO`
//!
//! ## Concurrency Model
//!
//! One `Engine` is shared by every connection thread behind an `Arc`.
//! Counters are atomics; the client registry sits behind a
//! `parking_lot::RwLock` and is only write-locked on connect, disconnect
//! and `CLIENT SETNAME`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::time::Instant;

use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::Config;
use crate::protocol::{ClientCommand, Command, Value};

/// Connection identifier, unique for the life of the engine
pub type ClientId = u64;

/// What the engine knows about a connected client
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub id: ClientId,
    pub addr: String,
    pub name: Option<String>,
    pub connected_at: Instant,
    /// Name of the most recent command, lower case
    pub last_command: Option<&'static str>,
}

/// The command executor shared by all connections
pub struct Engine {
    /// Server configuration (reported by INFO)
    config: Config,

    started_at: Instant,

    /// Port reported by INFO; the server stores the bound port here
    tcp_port: AtomicU16,

    next_client_id: AtomicU64,

    total_connections: AtomicU64,

    total_commands: AtomicU64,

    clients: RwLock<HashMap<ClientId, ClientInfo>>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let tcp_port = config
            .listen_addr
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse().ok())
            .unwrap_or(0);

        Self {
            config,
            started_at: Instant::now(),
            tcp_port: AtomicU16::new(tcp_port),
            next_client_id: AtomicU64::new(1),
            total_connections: AtomicU64::new(0),
            total_commands: AtomicU64::new(0),
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record the port the listener actually bound (differs from the
    /// configured one when that is 0)
    pub fn set_tcp_port(&self, port: u16) {
        self.tcp_port.store(port, Ordering::Relaxed);
    }

    pub fn tcp_port(&self) -> u16 {
        self.tcp_port.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Client Registry
    // =========================================================================

    /// Register a new connection and hand out its id
    pub fn register_client(&self, addr: impl Into<String>) -> ClientId {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.clients.write().insert(
            id,
            ClientInfo {
                id,
                addr: addr.into(),
                name: None,
                connected_at: Instant::now(),
                last_command: None,
            },
        );
        id
    }

    pub fn unregister_client(&self, id: ClientId) {
        self.clients.write().remove(&id);
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.read().len()
    }

    pub fn client_info(&self, id: ClientId) -> Option<ClientInfo> {
        self.clients.read().get(&id).cloned()
    }

    pub fn total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Resolve a decoded request and execute it.
    ///
    /// Requests that are not a valid command get an `ERR` reply rather than
    /// an error, so the connection stays usable.
    pub fn handle_request(&self, client: ClientId, request: Value) -> Value {
        match Command::from_value(request) {
            Ok(command) => self.execute(client, command),
            Err(e) => {
                tracing::debug!("Client {} sent invalid command: {}", client, e);
                e.to_value()
            }
        }
    }

    /// Execute a command on behalf of `client`
    pub fn execute(&self, client: ClientId, command: Command) -> Value {
        tracing::trace!("Client {} executing {}", client, command.name());
        self.total_commands.fetch_add(1, Ordering::Relaxed);
        if let Some(info) = self.clients.write().get_mut(&client) {
            info.last_command = Some(command_label(&command));
        }

        match command {
            Command::Ping { message: None } => Value::simple("PONG"),
            Command::Ping {
                message: Some(message),
            } => Value::bulk(message),
            Command::Echo { message } => Value::bulk(message),
            Command::Client(sub) => self.client_command(client, sub),
            Command::Info { section } => self.info(section.as_deref()),
        }
    }

    fn client_command(&self, client: ClientId, command: ClientCommand) -> Value {
        match command {
            ClientCommand::Id => Value::Integer(client as i64),
            ClientCommand::GetName => self
                .clients
                .read()
                .get(&client)
                .and_then(|info| info.name.clone())
                .map(Value::from)
                .unwrap_or_else(Value::null_bulk),
            ClientCommand::SetName(name) => {
                if let Some(info) = self.clients.write().get_mut(&client) {
                    info.name = if name.is_empty() { None } else { Some(name) };
                }
                Value::ok()
            }
            ClientCommand::List => Value::bulk(self.client_list()),
        }
    }

    /// One line per client, `CLIENT LIST` style
    fn client_list(&self) -> Bytes {
        let clients = self.clients.read();
        let mut ids: Vec<&ClientId> = clients.keys().collect();
        ids.sort();

        let mut out = String::new();
        for id in ids {
            let info = &clients[id];
            let _ = writeln!(
                out,
                "id={} addr={} name={} age={} cmd={}",
                info.id,
                info.addr,
                info.name.as_deref().unwrap_or(""),
                info.connected_at.elapsed().as_secs(),
                info.last_command.unwrap_or("NULL"),
            );
        }
        Bytes::from(out)
    }

    /// `INFO` text. Unknown sections produce an empty string, as Redis does.
    fn info(&self, section: Option<&str>) -> Value {
        let all = matches!(section, None | Some("all") | Some("default") | Some("everything"));
        let wants = |name: &str| all || section == Some(name);

        let mut sections = Vec::new();
        if wants("server") {
            sections.push(format!(
                "# Server\r\nkatredis_version:{}\r\nprocess_id:{}\r\ntcp_port:{}\r\nuptime_in_seconds:{}\r\n",
                crate::VERSION,
                std::process::id(),
                self.tcp_port(),
                self.started_at.elapsed().as_secs(),
            ));
        }
        if wants("clients") {
            sections.push(format!(
                "# Clients\r\nconnected_clients:{}\r\nmaxclients:{}\r\n",
                self.connected_clients(),
                self.config.max_connections,
            ));
        }
        if wants("stats") {
            sections.push(format!(
                "# Stats\r\ntotal_connections_received:{}\r\ntotal_commands_processed:{}\r\n",
                self.total_connections.load(Ordering::Relaxed),
                self.total_commands.load(Ordering::Relaxed),
            ));
        }

        Value::from(sections.join("\r\n"))
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ping { .. } => "ping",
        Command::Echo { .. } => "echo",
        Command::Info { .. } => "info",
        Command::Client(ClientCommand::Id) => "client|id",
        Command::Client(ClientCommand::GetName) => "client|getname",
        Command::Client(ClientCommand::SetName(_)) => "client|setname",
        Command::Client(ClientCommand::List) => "client|list",
    }
}
