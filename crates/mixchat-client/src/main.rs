//! mixchat binary.
//!
//! Line-oriented chat client front-end. Without `--peer`/`--provider` it
//! runs self-contained: the loopback transport echoes every sent message
//! back, so your own messages come back through the resolution pipeline.
//!
//! # Usage
//!
//! ```bash
//! # Self-contained echo session with a fresh identity
//! mixchat --store chatstore.redb
//!
//! # Address a specific peer (base64url keys)
//! mixchat --peer <b64_public_key> --provider <b64_provider_public_key>
//! ```

use std::path::PathBuf;

use clap::Parser;
use mixchat_client::{ChatClient, LoopbackTransport, StdoutDisplay};
use mixchat_proto::{Identity, PublicKey};
use mixchat_store::RedbDirectory;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// mixnet chat client with a persistent contact alias directory
#[derive(Parser, Debug)]
#[command(name = "mixchat")]
#[command(about = "Mixnet chat client with a persistent contact alias directory")]
#[command(version)]
struct Args {
    /// Path to the alias directory database
    #[arg(long, default_value = "chatstore.redb")]
    store: PathBuf,

    /// Recipient public key (base64url). Defaults to our own key, which
    /// with the loopback transport makes a self-contained echo session.
    #[arg(long)]
    peer: Option<String>,

    /// Recipient provider public key (base64url)
    #[arg(long)]
    provider: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Generate a fresh random key for this process's loopback identity.
fn random_key() -> PublicKey {
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    PublicKey::new(bytes)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("mixchat starting");
    tracing::info!("alias directory at {}", args.store.display());

    let directory = RedbDirectory::open(&args.store)?;

    let own_key = random_key();
    let provider_key = random_key();
    let transport = LoopbackTransport::with_echo(own_key, provider_key);

    let recipient = match (&args.peer, &args.provider) {
        (Some(peer), Some(provider)) => Identity::from_base64(peer, provider)?,
        (None, None) => Identity::new(own_key, provider_key),
        _ => {
            return Err("--peer and --provider must be given together".into());
        },
    };

    let mut client = ChatClient::new(transport, StdoutDisplay, directory, recipient);
    client.start();
    client.announce();
    client.show_available_commands();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/quit" {
            break;
        }
        client.handle_input(&line);
    }

    client.shutdown();
    tracing::info!("mixchat stopped");

    Ok(())
}
