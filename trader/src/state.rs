//! Shared state for a trader: the wallet this client submits transactions
//! as, and the miner addresses most recently pushed by the tracker.

use std::net::SocketAddr;

use parking_lot::Mutex;

pub struct TraderState {
    pub wallet: String,
    pub miners: Mutex<Vec<SocketAddr>>,
}

impl TraderState {
    pub fn new(wallet: String) -> Self {
        TraderState {
            wallet,
            miners: Mutex::new(Vec::new()),
        }
    }

    pub fn set_miners(&self, miners: Vec<SocketAddr>) {
        *self.miners.lock() = miners;
    }

    pub fn known_miners(&self) -> Vec<SocketAddr> {
        self.miners.lock().clone()
    }
}
