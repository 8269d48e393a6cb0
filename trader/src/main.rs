//! Entry point for `meridian-trader` (§4.6): registers a wallet with the
//! tracker, then repeatedly reads `<recipient> <amount>` lines from stdin
//! and submits each as a transaction to every known miner.

mod state;
mod submit;
mod tracker_conn;

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use meridian_config::TraderArgs;
use meridian_core::wire::{Frame, TypeCode};
use meridian_core::Transaction;
use tokio::io::{AsyncBufReadExt, BufReader};

use state::TraderState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = TraderArgs::parse();
    let state = Arc::new(TraderState::new(args.wallet.clone()));

    let tracker_addr: SocketAddr =
        format!("{}:{}", args.tracker_host, args.tracker_port).parse()?;
    let tracker_handle =
        tracker_conn::connect(state.clone(), tracker_addr, args.listen_port).await?;

    println!("registered wallet {} with the tracker, type: <recipient> <amount>", args.wallet);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((recipient, amount_str)) = line.split_once(' ') else {
            println!("expected '<recipient> <amount>'");
            continue;
        };
        let Ok(amount) = amount_str.trim().parse::<f64>() else {
            println!("'{amount_str}' is not a valid amount");
            continue;
        };

        let tx = Transaction::new(state.wallet.clone(), recipient.trim().to_string(), amount);
        match submit::submit_transaction(state.known_miners(), tx).await {
            Some(response) => println!("{response}"),
            None => println!("no miner responded"),
        }
    }

    let _ = tracker_handle.send(Frame::new(
        TypeCode::Nine,
        format!("{},{}", args.listen_port, args.wallet),
    ));
    Ok(())
}
