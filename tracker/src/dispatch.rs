//! Tracker message handling (§4.5). Type 9 is read here as a trader
//! unregistering — the tracker never receives a wallet-directory update,
//! since it is the one that produces them, so the overload resolves
//! unambiguously by role.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Result};
use meridian_core::directory;
use meridian_core::wire::{Frame, TypeCode};

use crate::peer;
use crate::state::{MinerEntry, TraderEntry, TrackerState};

pub async fn handle_frame(state: &Arc<TrackerState>, from: SocketAddr, frame: Frame) -> Result<()> {
    match frame.type_code {
        TypeCode::Close => {
            state.drop_connection(&from);
            broadcast_peer_list(state);
            broadcast_wallet_directory(state);
        }
        TypeCode::MinerRegister => {
            state.miners.lock().insert(
                from,
                MinerEntry {
                    listen_port: frame.payload,
                },
            );
            log::info!("miner registered: {from}");
            broadcast_peer_list(state);
            broadcast_wallet_directory(state);
        }
        TypeCode::TraderRegister => {
            let Some((port, wallet)) = frame.payload.split_once(',') else {
                bail!("trader registration payload missing ',' separator");
            };
            state.traders.lock().insert(
                from,
                TraderEntry {
                    listen_port: port.to_string(),
                    wallet: wallet.to_string(),
                },
            );
            state.remember_wallet(wallet);
            log::info!("trader registered: {from} ({wallet})");
            broadcast_peer_list(state);
            broadcast_wallet_directory(state);
        }
        TypeCode::Nine => {
            state.traders.lock().remove(&from);
            log::info!("trader unregistered: {from}");
            broadcast_wallet_directory(state);
        }
        TypeCode::Block
        | TypeCode::Chain
        | TypeCode::Transaction
        | TypeCode::PeerList
        | TypeCode::ChainRequest
        | TypeCode::TraderResponse => {
            log::warn!("tracker received role-mismatched message type from {from}");
        }
    }
    Ok(())
}

/// Push the current miner peer list (§6.2) to every connected socket,
/// miner and trader alike, matching the original tracker's `update_peers`.
pub fn broadcast_peer_list(state: &Arc<TrackerState>) {
    let payload = directory::format_peer_list(&state.miner_peer_list());
    let targets = state.broadcast_targets();
    peer::broadcast(&targets, Frame::new(TypeCode::PeerList, payload));
}

/// Push the combined all/active wallet packet (§6.3) to every registered
/// miner only — traders have no use for it.
pub fn broadcast_wallet_directory(state: &Arc<TrackerState>) {
    let all = state.all_wallets.lock().clone();
    let active = state.active_wallets();
    let payload = directory::format_wallet_packet(&all, &active);
    let targets = state.miner_targets();
    peer::broadcast(&targets, Frame::new(TypeCode::Nine, payload));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn new_state() -> Arc<TrackerState> {
        Arc::new(TrackerState::new())
    }

    fn register(state: &Arc<TrackerState>, addr: &str) -> (SocketAddr, mpsc::UnboundedReceiver<Frame>) {
        let addr: SocketAddr = addr.parse().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        state.register_connection(addr, tx);
        (addr, rx)
    }

    #[tokio::test]
    async fn miner_registration_broadcasts_peer_list_to_everyone() {
        let state = new_state();
        let (miner_addr, mut miner_rx) = register(&state, "127.0.0.1:1");
        let (_, mut trader_rx) = register(&state, "127.0.0.1:2");

        handle_frame(
            &state,
            miner_addr,
            Frame::new(TypeCode::MinerRegister, "6000"),
        )
        .await
        .unwrap();

        let miner_frame = miner_rx.recv().await.unwrap();
        assert_eq!(miner_frame.type_code, TypeCode::PeerList);
        assert_eq!(miner_frame.payload, "('127.0.0.1', '6000')");

        let trader_frame = trader_rx.recv().await.unwrap();
        assert_eq!(trader_frame.payload, miner_frame.payload);

        // A newly-registered miner also gets the wallet directory immediately,
        // so it doesn't reject valid transactions before the next trader joins.
        let wallet_frame = miner_rx.recv().await.unwrap();
        assert_eq!(wallet_frame.type_code, TypeCode::Nine);
    }

    #[tokio::test]
    async fn trader_registration_adds_wallet_and_broadcasts_directory() {
        let state = new_state();
        let (miner_addr, mut miner_rx) = register(&state, "127.0.0.1:4");
        handle_frame(
            &state,
            miner_addr,
            Frame::new(TypeCode::MinerRegister, "6000"),
        )
        .await
        .unwrap();
        miner_rx.recv().await.unwrap(); // drain peer-list push from the registration above
        miner_rx.recv().await.unwrap(); // drain wallet-directory push from the registration above

        let (trader_addr, mut trader_rx) = register(&state, "127.0.0.1:3");
        handle_frame(
            &state,
            trader_addr,
            Frame::new(TypeCode::TraderRegister, "7000,alice"),
        )
        .await
        .unwrap();

        trader_rx.recv().await.unwrap(); // peer-list push
        let peer_list_again = miner_rx.recv().await.unwrap();
        assert_eq!(peer_list_again.type_code, TypeCode::PeerList);
        let wallet_frame = miner_rx.recv().await.unwrap();
        assert_eq!(wallet_frame.type_code, TypeCode::Nine);
        assert_eq!(wallet_frame.payload, "alice;alice");
        assert_eq!(state.all_wallets.lock().clone(), vec!["alice".to_string()]);
    }

    #[tokio::test]
    async fn trader_unregistration_drops_wallet_from_active_list() {
        let state = new_state();
        let (_, mut miner_rx) = register(&state, "127.0.0.1:6");
        let (trader_addr, mut trader_rx) = register(&state, "127.0.0.1:5");
        handle_frame(
            &state,
            trader_addr,
            Frame::new(TypeCode::TraderRegister, "7000,alice"),
        )
        .await
        .unwrap();
        trader_rx.recv().await.unwrap(); // peer-list push
        miner_rx.recv().await.unwrap(); // peer-list push
        miner_rx.recv().await.unwrap(); // wallet-directory push

        handle_frame(&state, trader_addr, Frame::new(TypeCode::Nine, ""))
            .await
            .unwrap();

        let wallet_frame = miner_rx.recv().await.unwrap();
        assert_eq!(wallet_frame.payload, "alice;");
        assert!(state.traders.lock().is_empty());
    }

    #[tokio::test]
    async fn close_drops_connection_from_every_list() {
        let state = new_state();
        let (miner_addr, _miner_rx) = register(&state, "127.0.0.1:7");
        handle_frame(
            &state,
            miner_addr,
            Frame::new(TypeCode::MinerRegister, "6000"),
        )
        .await
        .unwrap();

        handle_frame(&state, miner_addr, Frame::new(TypeCode::Close, ""))
            .await
            .unwrap();

        assert!(state.miners.lock().is_empty());
        assert!(state.connections.lock().is_empty());
    }
}
