//! Tracker-side bookkeeping (§4.5): one list of registered miners, one list
//! of registered traders, and the accumulated wallet directory. Each list is
//! behind its own `parking_lot::Mutex` so a change to one never requires
//! holding both locks at once — the same discipline the original tracker
//! used around its `peer_list_lock` and `trader_list_lock`.

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use meridian_core::wire::Frame;

pub type PeerHandle = UnboundedSender<Frame>;

pub struct MinerEntry {
    pub listen_port: String,
}

pub struct TraderEntry {
    pub listen_port: String,
    pub wallet: String,
}

#[derive(Default)]
pub struct TrackerState {
    /// Every currently open socket, miner or trader, keyed by peer address.
    /// Separate from the role-specific lists below so a send never needs to
    /// know which list an address belongs to.
    pub connections: Mutex<HashMap<SocketAddr, PeerHandle>>,
    pub miners: Mutex<HashMap<SocketAddr, MinerEntry>>,
    pub traders: Mutex<HashMap<SocketAddr, TraderEntry>>,
    /// Every wallet address ever seen, append-only, never pruned on
    /// disconnect — mirrors the "all wallets" half of the wallet packet.
    pub all_wallets: Mutex<Vec<String>>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_connection(&self, addr: SocketAddr, handle: PeerHandle) {
        self.connections.lock().insert(addr, handle);
    }

    pub fn drop_connection(&self, addr: &SocketAddr) {
        self.connections.lock().remove(addr);
        self.miners.lock().remove(addr);
        self.traders.lock().remove(addr);
    }

    pub fn remember_wallet(&self, wallet: &str) {
        let mut wallets = self.all_wallets.lock();
        if !wallets.iter().any(|w| w == wallet) {
            wallets.push(wallet.to_string());
        }
    }

    pub fn active_wallets(&self) -> Vec<String> {
        self.traders
            .lock()
            .values()
            .map(|t| t.wallet.clone())
            .collect()
    }

    /// Snapshot of every registered miner as `(ip, port)` pairs for the
    /// peer-list packet (§6.2).
    pub fn miner_peer_list(&self) -> Vec<(String, String)> {
        self.miners
            .lock()
            .iter()
            .map(|(addr, entry)| (addr.ip().to_string(), entry.listen_port.clone()))
            .collect()
    }

    pub fn broadcast_targets(&self) -> Vec<(SocketAddr, PeerHandle)> {
        self.connections
            .lock()
            .iter()
            .map(|(addr, handle)| (*addr, handle.clone()))
            .collect()
    }

    pub fn miner_targets(&self) -> Vec<(SocketAddr, PeerHandle)> {
        let connections = self.connections.lock();
        self.miners
            .lock()
            .keys()
            .filter_map(|addr| connections.get(addr).map(|h| (*addr, h.clone())))
            .collect()
    }
}
