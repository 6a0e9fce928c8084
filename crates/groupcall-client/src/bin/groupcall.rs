//! Group-call client binary entry point
//!
//! Joins a room and turns stdin into chat lines and room commands.
//!
//! # Usage
//!
//! ```bash
//! # Join a room on a local server
//! cargo run --bin groupcall -- --name alice --room lobby
//!
//! # Use another server and STUN servers
//! cargo run --bin groupcall -- \
//!   --name alice --room lobby \
//!   --signaling-url wss://calls.example.org/groupcall \
//!   --stun-servers stun:stun.l.google.com:19302
//! ```
//!
//! Typed lines are sent as chat. `/leave`, `/visible`, `/feature NAME` and
//! `/who` are commands; Ctrl+C leaves the room.

use clap::Parser;
use groupcall_client::{
    ClientConfig, ConsoleView, RoomClient, RtcPeerConnector, TurnServerConfig, UserAction,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Group-call room client
///
/// Joins a room over WebSocket signaling and negotiates WebRTC peer
/// connections with every visible participant.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Display name, unique within the room
    #[arg(long, env = "GROUPCALL_NAME")]
    name: String,

    /// Room to join (created by the server if missing)
    #[arg(long, env = "GROUPCALL_ROOM")]
    room: String,

    /// JSON configuration file; command-line options override it
    #[arg(long, env = "GROUPCALL_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket signaling URL
    #[arg(long, env = "GROUPCALL_SIGNALING_URL")]
    signaling_url: Option<String>,

    /// STUN servers (comma-separated)
    #[arg(long, value_delimiter = ',', env = "GROUPCALL_STUN_SERVERS")]
    stun_servers: Vec<String>,

    /// TURN servers (format: turn:host:port:username:password, comma-separated)
    #[arg(long, value_delimiter = ',', env = "GROUPCALL_TURN_SERVERS")]
    turn_servers: Vec<String>,

    /// Milliseconds to wait for the server to confirm our departure
    #[arg(long, env = "GROUPCALL_LEAVE_TIMEOUT_MS")]
    leave_timeout_ms: Option<u64>,

    /// Do not send or receive audio
    #[arg(long, default_value_t = false, env = "GROUPCALL_NO_AUDIO")]
    no_audio: bool,
}

/// Parse TURN server string (format: turn:host:port:username:password or turns:...)
fn parse_turn_server(s: &str) -> Result<TurnServerConfig, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 5 {
        return Err(format!(
            "Invalid TURN server format: '{}'. Expected: turn:host:port:username:password",
            s
        ));
    }

    let protocol = parts[0];
    if protocol != "turn" && protocol != "turns" {
        return Err(format!(
            "Invalid TURN protocol: '{}'. Expected 'turn' or 'turns'",
            protocol
        ));
    }

    // Password may contain colons
    Ok(TurnServerConfig {
        url: format!("{}:{}:{}", protocol, parts[1], parts[2]),
        username: parts[3].to_string(),
        credential: parts[4..].join(":"),
    })
}

/// Layer command-line options over the config file or the defaults
fn build_config_from_args(args: &Args) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ClientConfig::from_json_file(path)?
        }
        None => ClientConfig::default(),
    };

    if let Some(url) = &args.signaling_url {
        config.signaling_url = url.clone();
    }
    if !args.stun_servers.is_empty() {
        config.stun_servers = args.stun_servers.clone();
    }
    if let Some(timeout) = args.leave_timeout_ms {
        config.leave_timeout_ms = timeout;
    }
    if args.no_audio {
        config.media.audio = false;
    }

    for turn_str in &args.turn_servers {
        let turn = parse_turn_server(turn_str)
            .map_err(|e| format!("Failed to parse TURN server: {}", e))?;
        info!("Adding TURN server: {} (user: {})", turn.url, turn.username);
        config.turn_servers.push(turn);
    }

    config.validate()?;
    Ok(config)
}

/// Map one stdin line to a user action
fn parse_input(line: &str) -> Option<UserAction> {
    let trimmed = line.trim();
    match trimmed {
        "/leave" => Some(UserAction::Leave),
        "/visible" => Some(UserAction::ToggleVisibility),
        "/who" => Some(UserAction::ShowRoster),
        _ => match trimmed.strip_prefix("/feature ") {
            Some(name) => Some(UserAction::ClickTile(name.trim().to_string())),
            None if trimmed.starts_with('/') => {
                eprintln!("Unknown command: {}", trimmed);
                None
            }
            None => Some(UserAction::Chat(line.to_string())),
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_tracing()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        name = %args.name,
        room = %args.room,
        "Group-call client starting"
    );

    let config = build_config_from_args(&args)?;
    let (actions, action_rx) = mpsc::unbounded_channel();

    let interrupt = actions.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCtrl+C received, leaving room...");
        let _ = interrupt.send(UserAction::Leave);
    })?;

    let peers = Arc::new(RtcPeerConnector::new(&config)?);
    let mut client = RoomClient::connect(config, peers, Box::new(ConsoleView::new())).await?;
    client.join(&args.name, &args.room)?;

    // Blocking reads on a plain thread so a pending read never holds up shutdown
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if let Some(action) = parse_input(&line) {
                        if actions.send(action).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        let _ = actions.send(UserAction::Leave);
    });

    let session = client.run(action_rx).await;
    info!(room = %session.room(), "Session finished");

    Ok(())
}

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG, defaulting to info
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    Ok(())
}
