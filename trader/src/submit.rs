//! Submitting a transaction to the known miner set and reporting the first
//! admission result (§4.6). The original CLI opened one fresh connection
//! per miner per transaction rather than reusing a persistent link, since a
//! transaction is submitted at most a few times a session; this keeps that
//! shape.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use meridian_core::wire::{Frame, TypeCode, WireCodec};
use meridian_core::Transaction;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

/// Send `tx` to every address in `miners`, concurrently, and return the
/// first `TraderResponse` payload any of them sends back. Returns `None` if
/// no miner responded within the timeout (including when `miners` is
/// empty).
pub async fn submit_transaction(miners: Vec<std::net::SocketAddr>, tx: Transaction) -> Option<String> {
    if miners.is_empty() {
        log::warn!("no known miners to submit the transaction to");
        return None;
    }

    let (result_tx, mut result_rx) = mpsc::channel::<String>(1);
    let payload = tx.to_wire();

    for addr in miners {
        let result_tx = result_tx.clone();
        let payload = payload.clone();
        tokio::spawn(async move {
            if let Err(e) = send_and_wait(addr, payload, result_tx).await {
                log::debug!("transaction submission to {addr} failed: {e}");
            }
        });
    }
    drop(result_tx);

    tokio::time::timeout(Duration::from_secs(10), result_rx.recv())
        .await
        .ok()
        .flatten()
}

async fn send_and_wait(
    addr: std::net::SocketAddr,
    payload: String,
    result_tx: mpsc::Sender<String>,
) -> anyhow::Result<()> {
    let stream = TcpStream::connect(addr).await?;
    let (read_half, write_half) = tokio::io::split(stream);
    let mut framed_read = FramedRead::new(read_half, WireCodec);
    let mut framed_write = FramedWrite::new(write_half, WireCodec);

    framed_write
        .send(Frame::new(TypeCode::Transaction, payload))
        .await?;

    if let Some(Ok(frame)) = framed_read.next().await {
        if frame.type_code == TypeCode::TraderResponse {
            let _ = result_tx.send(frame.payload).await;
        }
    }
    Ok(())
}
