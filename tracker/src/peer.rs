//! Accepts a connection and drives its read/write halves, same split-task
//! shape as the miner's peer loop: a write task drains an unbounded channel,
//! a read task decodes frames and hands them to [`crate::dispatch`].

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use meridian_core::wire::{Frame, WireCodec};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::dispatch;
use crate::state::TrackerState;

pub fn spawn_connection(state: Arc<TrackerState>, stream: TcpStream, addr: SocketAddr) {
    let (read_half, write_half) = tokio::io::split(stream);
    let mut framed_read = FramedRead::new(read_half, WireCodec);
    let mut framed_write = FramedWrite::new(write_half, WireCodec);
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    state.register_connection(addr, tx);
    log::info!("connection opened: {addr}");

    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = framed_write.send(frame).await {
                log::warn!("write to {addr} failed: {e}");
                break;
            }
        }
    });

    let read_state = state.clone();
    let read_task = tokio::spawn(async move {
        loop {
            match framed_read.next().await {
                Some(Ok(frame)) => {
                    if let Err(e) = dispatch::handle_frame(&read_state, addr, frame).await {
                        log::warn!("malformed message from {addr}: {e}");
                    }
                }
                Some(Err(e)) => {
                    log::warn!("frame decode error from {addr}: {e}");
                    break;
                }
                None => break,
            }
        }
    });

    let cleanup_state = state;
    tokio::spawn(async move {
        let _ = futures::future::select(write_task, read_task).await;
        cleanup_state.drop_connection(&addr);
        dispatch::broadcast_peer_list(&cleanup_state);
        dispatch::broadcast_wallet_directory(&cleanup_state);
        log::info!("connection closed: {addr}");
    });
}

pub fn broadcast(targets: &[(SocketAddr, mpsc::UnboundedSender<Frame>)], frame: Frame) {
    for (_, handle) in targets {
        let _ = handle.send(frame.clone());
    }
}
