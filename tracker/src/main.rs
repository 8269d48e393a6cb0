//! Entry point for `meridian-tracker` (§4.5): accepts registrations from
//! miners and traders and pushes peer-list and wallet-directory updates
//! whenever membership changes.

mod dispatch;
mod peer;
mod state;

use std::sync::Arc;

use clap::Parser;
use meridian_config::TrackerArgs;
use tokio::net::TcpListener;

use state::TrackerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = TrackerArgs::parse();
    let state = Arc::new(TrackerState::new());

    let listener = TcpListener::bind(("0.0.0.0", args.listen_port)).await?;
    log::info!("tracker listening on port {}", args.listen_port);

    loop {
        let (stream, addr) = listener.accept().await?;
        peer::spawn_connection(state.clone(), stream, addr);
    }
}
