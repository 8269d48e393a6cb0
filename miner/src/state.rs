//! Shared state a miner's connection tasks all read and mutate. Guarded with
//! `parking_lot::Mutex`, matching the teacher's peer manager — none of
//! these critical sections cross an `.await`, so the cheaper non-async lock
//! is the right fit.

use meridian_core::Blockchain;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use tokio::sync::mpsc::UnboundedSender;

use crate::peer::PeerHandle;

pub struct MinerState {
    /// `None` until the tracker reports this miner as the only peer, at
    /// which point it mines its own genesis (§4.1).
    pub blockchain: Mutex<Option<Blockchain>>,
    pub all_wallets: Mutex<Vec<String>>,
    pub active_wallets: Mutex<Vec<String>>,
    /// Every open socket this miner can address with `send_to`: outbound
    /// connections to other miners, the tracker connection, and whatever
    /// inbound connection a trader or peer is currently using.
    pub peers: Mutex<HashMap<SocketAddr, PeerHandle>>,
    /// The subset of `peers` that are other miners' gossip endpoints —
    /// the only addresses `peer::broadcast` sends Block/Chain/ChainRequest
    /// to. Populated only by `connect_to_peer` (an outbound dial made from
    /// the tracker's peer list), never by the tracker connection or by an
    /// inbound connection accepted on the listen socket, since a miner
    /// cannot tell an inbound peer-gossip connection apart from a trader's
    /// one-shot transaction socket by the accept() alone — the original
    /// gossiped only over its own outbound peer set for the same reason.
    pub miner_peer_addrs: Mutex<HashSet<SocketAddr>>,
    pub listen_port: u16,
}

impl MinerState {
    pub fn new(listen_port: u16) -> Self {
        MinerState {
            blockchain: Mutex::new(None),
            all_wallets: Mutex::new(Vec::new()),
            active_wallets: Mutex::new(Vec::new()),
            peers: Mutex::new(HashMap::new()),
            miner_peer_addrs: Mutex::new(HashSet::new()),
            listen_port,
        }
    }

    /// Mine a fresh genesis block if this miner doesn't yet have a chain.
    /// Called when the tracker reports this miner as the sole peer.
    pub fn bootstrap_genesis_if_alone(&self) {
        let mut chain = self.blockchain.lock();
        if chain.is_none() {
            log::info!("no peers known yet, mining our own genesis block");
            *chain = Some(Blockchain::new_with_genesis());
        }
    }

    pub fn register_peer(&self, addr: SocketAddr, handle: PeerHandle) {
        self.peers.lock().insert(addr, handle);
    }

    /// Mark `addr` as a miner gossip peer, so `peer::broadcast` includes it.
    pub fn mark_miner_peer(&self, addr: SocketAddr) {
        self.miner_peer_addrs.lock().insert(addr);
    }

    pub fn remove_peer(&self, addr: &SocketAddr) {
        self.peers.lock().remove(addr);
        self.miner_peer_addrs.lock().remove(addr);
    }
}
