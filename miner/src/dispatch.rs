//! Per-message handling for frames arriving on a peer connection (§4.4).
//! Each branch mirrors one indicator from the original miner's connection
//! handler: blocks extend or trigger a chain request, chains reconcile,
//! transactions are admitted and mined, and type 9 is read here as a
//! wallet-directory update (a miner never receives a trader unregistration,
//! so the overload resolves unambiguously by role).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use meridian_core::wire::{Frame, TypeCode};
use meridian_core::{directory, AdmissionError};
use meridian_core::{Blockchain, ReconcileOutcome, Transaction};

use crate::peer;
use crate::state::MinerState;

pub async fn handle_frame(state: &Arc<MinerState>, from: SocketAddr, frame: Frame) -> Result<()> {
    match frame.type_code {
        TypeCode::Close => {
            log::debug!("{from} sent an explicit close");
        }
        TypeCode::Block => handle_block(state, from, &frame.payload).await?,
        TypeCode::Chain => handle_chain(state, &frame.payload)?,
        TypeCode::Transaction => handle_transaction(state, from, &frame.payload).await?,
        TypeCode::PeerList => handle_peer_list(state, &frame.payload).await?,
        TypeCode::ChainRequest => handle_chain_request(state, from),
        TypeCode::Nine => handle_wallet_directory(state, &frame.payload),
        TypeCode::MinerRegister | TypeCode::TraderRegister | TypeCode::TraderResponse => {
            log::warn!("miner received role-mismatched message type from {from}");
        }
    }
    Ok(())
}

async fn handle_block(state: &Arc<MinerState>, from: SocketAddr, payload: &str) -> Result<()> {
    let block = meridian_core::block::Block::from_wire(payload).context("decoding block")?;
    let added = {
        let mut guard = state.blockchain.lock();
        match guard.as_mut() {
            Some(chain) => chain.try_add_block(block.clone()),
            None => {
                *guard = Some(Blockchain::from_blocks(vec![block.clone()]));
                true
            }
        }
    };
    if added {
        peer::broadcast(state, Frame::new(TypeCode::Block, payload.to_string()));
    } else {
        log::debug!("block from {from} did not extend our tip, requesting chains from all peers");
        peer::broadcast(state, Frame::new(TypeCode::ChainRequest, ""));
    }
    Ok(())
}

fn handle_chain(state: &Arc<MinerState>, payload: &str) -> Result<()> {
    let blocks = Blockchain::from_wire(payload).context("decoding chain")?;

    // §4.2 rule 1: no local chain yet means unconditional adoption — the
    // ordinary reconcile() comparison has nothing to compare against.
    let rebroadcast = {
        let mut guard = state.blockchain.lock();
        match guard.as_mut() {
            Some(chain) => match chain.reconcile(blocks) {
                ReconcileOutcome::Adopted | ReconcileOutcome::RebroadcastLocal => {
                    Some(chain.to_wire())
                }
                ReconcileOutcome::NoAction => None,
            },
            None => {
                if Blockchain::is_valid_chain(&blocks) {
                    let chain = Blockchain::from_blocks(blocks);
                    let wire = chain.to_wire();
                    *guard = Some(chain);
                    Some(wire)
                } else {
                    None
                }
            }
        }
    };

    if let Some(wire) = rebroadcast {
        peer::broadcast(state, Frame::new(TypeCode::Chain, wire));
    }
    Ok(())
}

fn handle_chain_request(state: &Arc<MinerState>, from: SocketAddr) {
    let wire = {
        let guard = state.blockchain.lock();
        guard.as_ref().map(Blockchain::to_wire)
    };
    if let Some(wire) = wire {
        peer::send_to(state, from, Frame::new(TypeCode::Chain, wire));
    }
}

async fn handle_transaction(state: &Arc<MinerState>, from: SocketAddr, payload: &str) -> Result<()> {
    let tx = Transaction::from_wire(payload).context("decoding transaction")?;

    let all_wallets = state.all_wallets.lock().clone();
    let active_wallets = state.active_wallets.lock().clone();
    let snapshot = {
        let guard = state.blockchain.lock();
        guard.as_ref().map(|c| c.blocks().to_vec())
    };
    let Some(chain_blocks) = snapshot else {
        log::warn!("transaction from {from} arrived before we had a chain");
        return Ok(());
    };

    let outcome = meridian_core::admission::verify_transaction(
        &tx,
        &all_wallets,
        &active_wallets,
        &chain_blocks,
    );

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(AdmissionError::Duplicate) => {
            log::debug!("dropping duplicate transaction {}", tx.id);
            return Ok(());
        }
        Err(e) => {
            respond_to_sender(state, from, &format!("rejected: {e}"));
            return Ok(());
        }
    };

    let tx_wire = tx.to_wire();
    let state_for_mining = state.clone();
    let mined_block = tokio::task::spawn_blocking(move || {
        let mut guard = state_for_mining.blockchain.lock();
        let chain = guard.as_mut().expect("chain exists: checked above");
        chain.mine_next(tx_wire)
    })
    .await
    .context("mining task panicked")?;

    peer::broadcast(
        state,
        Frame::new(TypeCode::Block, mined_block.to_wire()),
    );
    respond_to_sender(
        state,
        from,
        &format!(
            "accepted: new balance for {} is {}",
            tx.sender, outcome.remaining_balance
        ),
    );
    Ok(())
}

fn respond_to_sender(state: &Arc<MinerState>, from: SocketAddr, message: &str) {
    peer::send_to(
        state,
        from,
        Frame::new(TypeCode::TraderResponse, message.to_string()),
    );
}

async fn handle_peer_list(state: &Arc<MinerState>, payload: &str) -> Result<()> {
    let entries = directory::parse_peer_list(payload);
    if entries.len() <= 1 {
        let state_for_mining = state.clone();
        tokio::task::spawn_blocking(move || state_for_mining.bootstrap_genesis_if_alone())
            .await
            .context("genesis mining task panicked")?;
    }
    for (ip, port) in entries {
        if port == state.listen_port.to_string() && ip == "127.0.0.1" {
            continue;
        }
        if let Ok(addr) = format!("{ip}:{port}").parse::<SocketAddr>() {
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(e) = peer::connect_to_peer(state, addr).await {
                    log::debug!("could not connect to peer {addr}: {e}");
                }
            });
        }
    }
    Ok(())
}

fn handle_wallet_directory(state: &Arc<MinerState>, payload: &str) {
    let (all_wallets, active_wallets) = directory::parse_wallet_packet(payload);
    *state.all_wallets.lock() = all_wallets;
    *state.active_wallets.lock() = active_wallets;
}
