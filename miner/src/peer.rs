//! Per-connection task pair: one task reads frames off the socket and
//! dispatches them, the other drains an unbounded channel and writes
//! frames out. Splitting read and write this way means a slow peer can
//! never block us from broadcasting to the others — the same decoupling
//! the teacher's peer manager used around its own framed connections.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use meridian_core::wire::{Frame, WireCodec};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::dispatch;
use crate::state::MinerState;

pub type PeerHandle = UnboundedSender<Frame>;

/// Take ownership of an established connection to `addr`, register it in
/// `state`, and drive its read/write halves until either side closes.
pub fn spawn_peer_connection(state: Arc<MinerState>, stream: TcpStream, addr: SocketAddr) {
    let (read_half, write_half) = tokio::io::split(stream);
    let mut framed_read = FramedRead::new(read_half, WireCodec);
    let mut framed_write = FramedWrite::new(write_half, WireCodec);
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    state.register_peer(addr, tx);
    log::info!("peer connected: {addr}");

    let write_state = state.clone();
    let write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = framed_write.send(frame).await {
                log::warn!("write to {addr} failed: {e}");
                break;
            }
        }
        let _ = write_state;
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
        cleanup_state.remove_peer(&addr);
        log::info!("peer disconnected: {addr}");
    });
}

/// Dial `addr` and hand the resulting stream to [`spawn_peer_connection`].
/// Returns without side effects if the connection is already established.
/// Marks `addr` as a gossip peer (so block/chain broadcasts reach it) and
/// immediately issues a chain-request to it (§4.4 Bootstrap): a miner that
/// wasn't alone on the tracker's peer list adopts the network's chain this
/// way instead of mining its own genesis.
pub async fn connect_to_peer(state: Arc<MinerState>, addr: SocketAddr) -> std::io::Result<()> {
    if state.peers.lock().contains_key(&addr) {
        return Ok(());
    }
    let stream = TcpStream::connect(addr).await?;
    spawn_peer_connection(state.clone(), stream, addr);
    state.mark_miner_peer(addr);
    send_to(
        &state,
        addr,
        Frame::new(meridian_core::wire::TypeCode::ChainRequest, ""),
    );
    Ok(())
}

/// Dial the tracker and register this miner's listen port (§4.5). The
/// tracker connection is tracked in the same `peers` map as ordinary
/// connections so it can still be addressed with `send_to`, but it is
/// deliberately never marked as a gossip peer — block/chain broadcasts must
/// never reach the tracker, which has no use for them.
pub async fn connect_to_tracker(
    state: Arc<MinerState>,
    tracker_addr: SocketAddr,
) -> std::io::Result<()> {
    let stream = TcpStream::connect(tracker_addr).await?;
    spawn_peer_connection(state.clone(), stream, tracker_addr);
    send_to(
        &state,
        tracker_addr,
        Frame::new(
            meridian_core::wire::TypeCode::MinerRegister,
            state.listen_port.to_string(),
        ),
    );
    Ok(())
}

/// Send `frame` to every known miner gossip peer (never to the tracker
/// connection, and never to an inbound connection that turns out to be a
/// trader's one-shot transaction socket — a miner cannot tell those apart
/// from an inbound peer connection at accept() time, so only connections
/// this miner itself dialed via [`connect_to_peer`] are gossip targets).
/// Dropped receivers (a peer whose task has already exited) are pruned
/// opportunistically.
pub fn broadcast(state: &Arc<MinerState>, frame: Frame) {
    let mut dead = Vec::new();
    {
        let peer_addrs = state.miner_peer_addrs.lock();
        let peers = state.peers.lock();
        for addr in peer_addrs.iter() {
            match peers.get(addr) {
                Some(handle) if handle.send(frame.clone()).is_err() => dead.push(*addr),
                Some(_) => {}
                None => dead.push(*addr),
            }
        }
    }
    for addr in dead {
        state.remove_peer(&addr);
    }
}

/// Send `frame` to a single peer by address, if still connected.
pub fn send_to(state: &Arc<MinerState>, addr: SocketAddr, frame: Frame) {
    let peers = state.peers.lock();
    if let Some(handle) = peers.get(&addr) {
        let _ = handle.send(frame);
    }
}
