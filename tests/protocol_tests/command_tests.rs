//! Tests for Command parsing

use bytes::Bytes;
use katredis::protocol::{ClientCommand, Command, CommandError, Value, ValueKind};

fn parse(args: &[&str]) -> Result<Command, CommandError> {
    Command::from_value(Value::command(args))
}

// =============================================================================
// Valid Commands
// =============================================================================

#[test]
fn test_parse_ping() {
    assert_eq!(parse(&["PING"]), Ok(Command::Ping { message: None }));
    assert_eq!(
        parse(&["ping", "hi"]),
        Ok(Command::Ping {
            message: Some(Bytes::from_static(b"hi"))
        })
    );
}

#[test]
fn test_parse_echo_is_binary_safe() {
    let request = Value::array(vec![
        Value::bulk("EcHo"),
        Value::bulk(Bytes::from_static(b"\x00a\r\nb")),
    ]);
    assert_eq!(
        Command::from_value(request),
        Ok(Command::Echo {
            message: Bytes::from_static(b"\x00a\r\nb")
        })
    );
}

#[test]
fn test_parse_info_lowercases_section() {
    assert_eq!(parse(&["INFO"]), Ok(Command::Info { section: None }));
    assert_eq!(
        parse(&["info", "Clients"]),
        Ok(Command::Info {
            section: Some("clients".to_string())
        })
    );
}

#[test]
fn test_parse_client_subcommands() {
    assert_eq!(parse(&["CLIENT", "ID"]), Ok(Command::Client(ClientCommand::Id)));
    assert_eq!(
        parse(&["client", "getname"]),
        Ok(Command::Client(ClientCommand::GetName))
    );
    assert_eq!(
        parse(&["CLIENT", "list"]),
        Ok(Command::Client(ClientCommand::List))
    );
    assert_eq!(
        parse(&["CLIENT", "SETNAME", "worker-1"]),
        Ok(Command::Client(ClientCommand::SetName("worker-1".to_string())))
    );
    assert_eq!(
        parse(&["CLIENT", "SETNAME", ""]),
        Ok(Command::Client(ClientCommand::SetName(String::new())))
    );
}

#[test]
fn test_simple_string_arguments_accepted() {
    let request = Value::array(vec![Value::simple("ECHO"), Value::simple("inline")]);
    assert_eq!(
        Command::from_value(request),
        Ok(Command::Echo {
            message: Bytes::from_static(b"inline")
        })
    );
}

#[test]
fn test_command_names() {
    assert_eq!(parse(&["ping"]).unwrap().name(), "PING");
    assert_eq!(parse(&["echo", "x"]).unwrap().name(), "ECHO");
    assert_eq!(parse(&["client", "id"]).unwrap().name(), "CLIENT");
    assert_eq!(parse(&["info"]).unwrap().name(), "INFO");
}

// =============================================================================
// Invalid Requests
// =============================================================================

#[test]
fn test_request_must_be_array() {
    assert_eq!(
        Command::from_value(Value::simple("PING")),
        Err(CommandError::NotAnArray(ValueKind::SimpleString))
    );
    assert_eq!(
        Command::from_value(Value::array(vec![])),
        Err(CommandError::Empty)
    );
}

#[test]
fn test_arguments_must_be_strings() {
    let request = Value::array(vec![Value::bulk("ECHO"), Value::Integer(5)]);
    assert_eq!(
        Command::from_value(request),
        Err(CommandError::InvalidArgument(ValueKind::Integer))
    );

    let request = Value::array(vec![Value::bulk("ECHO"), Value::null_bulk()]);
    assert_eq!(
        Command::from_value(request),
        Err(CommandError::InvalidArgument(ValueKind::BulkString))
    );
}

#[test]
fn test_unknown_command_keeps_caller_case() {
    let err = parse(&["FlushAll"]).unwrap_err();
    assert_eq!(err, CommandError::UnknownCommand("FlushAll".to_string()));
    assert_eq!(err.to_value(), Value::error("ERR unknown command 'FlushAll'"));
}

#[test]
fn test_wrong_arity() {
    assert_eq!(
        parse(&["PING", "a", "b"]),
        Err(CommandError::WrongArity("ping".to_string()))
    );
    assert_eq!(
        parse(&["ECHO"]),
        Err(CommandError::WrongArity("echo".to_string()))
    );
    assert_eq!(
        parse(&["INFO", "a", "b"]),
        Err(CommandError::WrongArity("info".to_string()))
    );
    assert_eq!(
        parse(&["CLIENT"]),
        Err(CommandError::WrongArity("client".to_string()))
    );
    assert_eq!(
        parse(&["CLIENT", "ID", "extra"]),
        Err(CommandError::WrongArity("client|id".to_string()))
    );
    assert_eq!(
        parse(&["CLIENT", "SETNAME"]),
        Err(CommandError::WrongArity("client|setname".to_string()))
    );

    let reply = parse(&["ECHO"]).unwrap_err().to_value();
    assert_eq!(
        reply,
        Value::error("ERR wrong number of arguments for 'echo' command")
    );
}

#[test]
fn test_unknown_client_subcommand() {
    assert_eq!(
        parse(&["CLIENT", "kill"]),
        Err(CommandError::UnknownSubcommand {
            command: "CLIENT".to_string(),
            sub: "KILL".to_string(),
        })
    );
}

#[test]
fn test_client_name_validation() {
    assert_eq!(
        parse(&["CLIENT", "SETNAME", "has space"]),
        Err(CommandError::InvalidClientName)
    );
    assert_eq!(
        parse(&["CLIENT", "SETNAME", "tab\there"]),
        Err(CommandError::InvalidClientName)
    );
}
