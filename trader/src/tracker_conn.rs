//! The trader's single long-lived connection to the tracker (§4.6): it
//! registers once and then just listens, updating its miner list whenever
//! the tracker pushes a new peer-list packet.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use meridian_core::directory;
use meridian_core::wire::{Frame, TypeCode, WireCodec};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::state::TraderState;

/// Connect to the tracker, send the type-8 registration, and spawn a task
/// that keeps `state.miners` in sync with every peer-list push. Returns a
/// sender that can later be used to transmit the type-9 unregistration.
pub async fn connect(
    state: Arc<TraderState>,
    tracker_addr: SocketAddr,
    listen_port: u16,
) -> std::io::Result<UnboundedSender<Frame>> {
    let stream = TcpStream::connect(tracker_addr).await?;
    let (read_half, write_half) = tokio::io::split(stream);
    let mut framed_read = FramedRead::new(read_half, WireCodec);
    let mut framed_write = FramedWrite::new(write_half, WireCodec);
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if framed_write.send(frame).await.is_err() {
                break;
            }
        }
    });

    let registration = Frame::new(
        TypeCode::TraderRegister,
        format!("{listen_port},{}", state.wallet),
    );
    let _ = tx.send(registration);

    let read_state = state.clone();
    tokio::spawn(async move {
        while let Some(Ok(frame)) = framed_read.next().await {
            if frame.type_code == TypeCode::PeerList {
                let entries = directory::parse_peer_list(&frame.payload);
                let miners = entries
                    .into_iter()
                    .filter_map(|(ip, port)| format!("{ip}:{port}").parse().ok())
                    .collect();
                read_state.set_miners(miners);
            } else {
                log::debug!("trader ignored unexpected message type from tracker");
            }
        }
        log::info!("tracker connection closed");
    });

    Ok(tx)
}
