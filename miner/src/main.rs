//! Entry point for `meridian-miner` (§4.1, §4.4): connects to the tracker,
//! accepts connections from other miners, mines blocks for admitted
//! transactions, and gossips blocks and chains across the peer set.

mod dispatch;
mod peer;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use meridian_config::MinerArgs;
use tokio::net::TcpListener;

use state::MinerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = MinerArgs::parse();
    let state = Arc::new(MinerState::new(args.listen_port));

    let listener = TcpListener::bind(("0.0.0.0", args.listen_port)).await?;
    log::info!("miner listening on port {}", args.listen_port);

    let tracker_addr: SocketAddr =
        format!("{}:{}", args.tracker_host, args.tracker_port).parse()?;
    peer::connect_to_tracker(state.clone(), tracker_addr).await?;

    loop {
        let (stream, addr) = listener.accept().await?;
        peer::spawn_peer_connection(state.clone(), stream, addr);
    }
}
