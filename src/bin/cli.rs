//! katredis CLI Client
//!
//! Command-line interface for talking to a RESP server.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use katredis::network::Client;
use katredis::Value;

/// katredis CLI
#[derive(Parser, Debug)]
#[command(name = "katredis-cli")]
#[command(about = "CLI for katredis and other RESP servers")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Command to run; starts an interactive prompt when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping {
        /// Optional message to echo back instead of PONG
        message: Option<String>,
    },

    /// Echo a message
    Echo {
        /// The message to echo
        message: String,
    },

    /// Show server information
    Info {
        /// Section: server, clients, stats or all
        section: Option<String>,
    },

    /// Send an arbitrary command, e.g. `raw CLIENT SETNAME me`
    Raw {
        #[arg(required = true)]
        args: Vec<String>,
    },
}

impl Commands {
    fn into_args(self) -> Vec<String> {
        match self {
            Commands::Ping { message } => {
                let mut args = vec!["PING".to_string()];
                args.extend(message);
                args
            }
            Commands::Echo { message } => vec!["ECHO".to_string(), message],
            Commands::Info { section } => {
                let mut args = vec!["INFO".to_string()];
                args.extend(section);
                args
            }
            Commands::Raw { args } => args,
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut client = match Client::connect(&args.server) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Could not connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    match args.command {
        Some(command) => {
            if !run(&mut client, &command.into_args()) {
                std::process::exit(1);
            }
        }
        None => repl(&mut client, &args.server),
    }
}

/// Send one command and print the reply. Returns false on failure.
fn run(client: &mut Client, args: &[String]) -> bool {
    match client.command(args) {
        Ok(reply) => {
            println!("{}", reply);
            !matches!(reply, Value::Error(_) | Value::BulkError(_))
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            false
        }
    }
}

fn repl(client: &mut Client, server: &str) {
    let stdin = io::stdin();
    loop {
        print!("{}> ", server);
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }

        let words: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        match words.first().map(|w| w.to_ascii_lowercase()) {
            None => continue,
            Some(ref w) if w == "quit" || w == "exit" => break,
            Some(_) => {
                run(client, &words);
            }
        }
    }
}
