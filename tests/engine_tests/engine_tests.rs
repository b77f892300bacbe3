//! Tests for Engine
//!
//! These tests verify:
//! - Command execution and reply shapes
//! - The client registry behind CLIENT
//! - INFO sections and statistics
//! - Concurrent access from many threads

use std::sync::Arc;
use std::thread;

use katredis::config::Config;
use katredis::engine::Engine;
use katredis::protocol::{ClientCommand, Command, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine {
    let config = Config::builder()
        .listen_addr("127.0.0.1:7000")
        .max_connections(16)
        .build();
    Engine::new(config)
}

fn request(engine: &Engine, client: u64, args: &[&str]) -> Value {
    engine.handle_request(client, Value::command(args))
}

fn info_text(reply: Value) -> String {
    reply
        .as_text()
        .expect("INFO replies with a bulk string")
        .to_string()
}

// =============================================================================
// Basic Commands
// =============================================================================

#[test]
fn test_ping_and_echo() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    assert_eq!(request(&engine, client, &["PING"]), Value::simple("PONG"));
    assert_eq!(request(&engine, client, &["PING", "hey"]), Value::bulk("hey"));
    assert_eq!(request(&engine, client, &["ECHO", ""]), Value::bulk(""));
    assert_eq!(engine.total_commands(), 3);
}

#[test]
fn test_invalid_requests_get_error_replies() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    assert_eq!(
        request(&engine, client, &["NOPE"]),
        Value::error("ERR unknown command 'NOPE'")
    );
    assert_eq!(
        engine.handle_request(client, Value::Integer(1)),
        Value::error("ERR Protocol error: expected array, got integer")
    );
    // Rejected requests are not counted as processed commands
    assert_eq!(engine.total_commands(), 0);
}

// =============================================================================
// Client Registry Tests
// =============================================================================

#[test]
fn test_client_ids_are_unique() {
    let engine = setup_engine();
    let a = engine.register_client("10.0.0.1:1");
    let b = engine.register_client("10.0.0.2:2");

    assert_ne!(a, b);
    assert_eq!(request(&engine, a, &["CLIENT", "ID"]), Value::Integer(a as i64));
    assert_eq!(request(&engine, b, &["CLIENT", "ID"]), Value::Integer(b as i64));
    assert_eq!(engine.connected_clients(), 2);

    engine.unregister_client(a);
    assert_eq!(engine.connected_clients(), 1);
    assert!(engine.client_info(a).is_none());
}

#[test]
fn test_client_setname_getname() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    assert_eq!(
        request(&engine, client, &["CLIENT", "GETNAME"]),
        Value::null_bulk()
    );
    assert_eq!(
        request(&engine, client, &["CLIENT", "SETNAME", "indexer"]),
        Value::ok()
    );
    assert_eq!(
        request(&engine, client, &["CLIENT", "GETNAME"]),
        Value::bulk("indexer")
    );

    // Empty name clears it
    request(&engine, client, &["CLIENT", "SETNAME", ""]);
    assert_eq!(
        request(&engine, client, &["CLIENT", "GETNAME"]),
        Value::null_bulk()
    );
}

#[test]
fn test_client_list() {
    let engine = setup_engine();
    let a = engine.register_client("10.0.0.1:1111");
    let b = engine.register_client("10.0.0.2:2222");
    engine.execute(b, Command::Client(ClientCommand::SetName("second".to_string())));

    let reply = request(&engine, a, &["CLIENT", "LIST"]);
    let text = reply.as_text().unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(&format!("id={} addr=10.0.0.1:1111 name= ", a)));
    assert!(lines[0].ends_with("cmd=client|list"));
    assert!(lines[1].starts_with(&format!("id={} addr=10.0.0.2:2222 name=second ", b)));
    assert!(lines[1].ends_with("cmd=client|setname"));
}

#[test]
fn test_last_command_recorded() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    assert_eq!(engine.client_info(client).unwrap().last_command, None);
    request(&engine, client, &["ECHO", "x"]);
    assert_eq!(engine.client_info(client).unwrap().last_command, Some("echo"));
}

// =============================================================================
// INFO Tests
// =============================================================================

#[test]
fn test_info_all_sections() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    let text = info_text(request(&engine, client, &["INFO"]));
    assert!(text.starts_with("# Server\r\n"));
    assert!(text.contains(&format!("katredis_version:{}\r\n", katredis::VERSION)));
    assert!(text.contains("tcp_port:7000\r\n"));
    assert!(text.contains("# Clients\r\nconnected_clients:1\r\nmaxclients:16\r\n"));
    assert!(text.contains("# Stats\r\ntotal_connections_received:1\r\n"));

    assert!(text.ends_with("total_commands_processed:1\r\n"));

    // "all", "default" and "everything" are synonyms for no section
    for section in ["all", "default", "everything"] {
        let text = info_text(request(&engine, client, &["INFO", section]));
        for header in ["# Server", "# Clients", "# Stats"] {
            assert!(text.contains(header), "{} missing from INFO {}", header, section);
        }
    }
}

#[test]
fn test_info_reports_bound_port() {
    let engine = Engine::new(Config::builder().listen_addr("127.0.0.1:0").build());
    let client = engine.register_client("127.0.0.1:50000");
    assert_eq!(engine.tcp_port(), 0);

    engine.set_tcp_port(41234);
    let text = info_text(request(&engine, client, &["INFO", "server"]));
    assert!(text.contains("tcp_port:41234\r\n"));
}

#[test]
fn test_info_single_section() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    let clients = info_text(request(&engine, client, &["INFO", "CLIENTS"]));
    assert_eq!(clients, "# Clients\r\nconnected_clients:1\r\nmaxclients:16\r\n");

    let stats = info_text(request(&engine, client, &["INFO", "stats"]));
    assert_eq!(
        stats,
        "# Stats\r\ntotal_connections_received:1\r\ntotal_commands_processed:2\r\n"
    );
}

#[test]
fn test_info_unknown_section_is_empty() {
    let engine = setup_engine();
    let client = engine.register_client("127.0.0.1:50000");

    assert_eq!(request(&engine, client, &["INFO", "keyspace"]), Value::bulk(""));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_clients() {
    let engine = Arc::new(setup_engine());
    let mut handles = Vec::new();

    for t in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let client = engine.register_client(format!("127.0.0.1:{}", 40000 + t));
            let name = format!("thread-{}", t);
            engine.handle_request(client, Value::command(["CLIENT", "SETNAME", name.as_str()]));
            for i in 0..100 {
                let msg = format!("{}-{}", t, i);
                let reply = engine.handle_request(client, Value::command(["ECHO", msg.as_str()]));
                assert_eq!(reply, Value::bulk(msg));
            }
            assert_eq!(
                engine.handle_request(client, Value::command(["CLIENT", "GETNAME"])),
                Value::bulk(name)
            );
            engine.unregister_client(client);
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.connected_clients(), 0);
    assert_eq!(engine.total_commands(), 8 * 102);
}
