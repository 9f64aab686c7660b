//! Realtime chat delivery server.
//!
//! Run with:
//! ```not_rust
//! HIROBA_TOKEN_SECRET=change-me cargo run --bin hiroba-server -- --fixtures fixtures.json
//! HIROBA_TOKEN_SECRET=change-me cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! HIROBA_TOKEN_SECRET=change-me cargo run --bin hiroba-server -- issue-token --user-id alice
//! ```

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use hiroba_server::{
    domain::{Timestamp, UserId},
    infrastructure::{
        identity::HmacIdentityGateway,
        realtime::InMemoryRealtimeHub,
        repository::{
            Fixtures, InMemoryGroupRepository, InMemoryMessageRepository, InMemoryUserRepository,
        },
    },
    ui::{AppState, Gateways, Server},
};
use hiroba_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Realtime chat delivery server (direct messages, groups, typing)", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value = "8080")]
    port: u16,

    /// HMAC key used to sign and verify bearer credentials
    #[arg(long, env = "HIROBA_TOKEN_SECRET", hide_env_values = true)]
    token_secret: String,

    /// JSON file of users and groups loaded at start-up
    #[arg(long, env = "HIROBA_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, default_value = "debug")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a bearer credential for a user
    IssueToken {
        #[arg(long)]
        user_id: String,

        /// Lifetime of the credential in seconds
        #[arg(long, default_value = "86400")]
        ttl_secs: i64,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    if let Err(e) = run(args).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let identity = Arc::new(HmacIdentityGateway::new(&args.token_secret, clock.clone())?);

    if let Some(Command::IssueToken { user_id, ttl_secs }) = args.command {
        let user_id = UserId::new(user_id)?;
        println!("{}", identity.issue(&user_id, ttl_secs.saturating_mul(1000)));
        return Ok(());
    }

    // Initialize dependencies in order:
    // 1. Repositories (+ fixtures)
    // 2. Realtime hub
    // 3. UseCases (AppState)
    // 4. Server

    // 1. Create Repositories (in-memory database)
    let users = Arc::new(InMemoryUserRepository::new());
    let groups = Arc::new(InMemoryGroupRepository::new());
    let messages = Arc::new(InMemoryMessageRepository::new());
    if let Some(path) = &args.fixtures {
        Fixtures::load(path)?
            .apply(
                users.as_ref(),
                groups.as_ref(),
                Timestamp::new(clock.now_millis()),
            )
            .await?;
    }

    // 2. Create the realtime hub (connection registry + room manager)
    let hub = Arc::new(InMemoryRealtimeHub::new());

    // 3. Create UseCases
    let state = AppState::new(Gateways {
        identity,
        users,
        groups,
        messages,
        registry: hub.clone(),
        rooms: hub.clone(),
        clock,
    });

    // 4. Run the server
    Server::new(state).run(&args.host, args.port).await?;

    let (connections, users, rooms) = hub.stats().await;
    tracing::info!(
        "Shutdown with {} live connections ({} users) in {} rooms",
        connections,
        users,
        rooms
    );
    Ok(())
}
