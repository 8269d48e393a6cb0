//! Command-line argument structs shared by the three binaries. Each role
//! gets its own `clap::Parser` struct rather than one do-everything struct,
//! matching the original wallet CLI's one-struct-per-subcommand layout.

use clap::Parser;

fn default_tracker_port() -> u16 {
    7878
}

/// `meridian-miner` (§4.1, §4.4): mines blocks, gossips with peer miners,
/// and registers itself with the tracker so other miners and traders can
/// find it.
#[derive(Debug, Parser)]
#[command(name = "meridian-miner", about = "Proof-of-work miner node")]
pub struct MinerArgs {
    /// Host the tracker is listening on.
    #[arg(long, default_value = "127.0.0.1")]
    pub tracker_host: String,

    /// Port the tracker is listening on.
    #[arg(long, default_value_t = default_tracker_port())]
    pub tracker_port: u16,

    /// Port this miner listens on for peer miner connections.
    #[arg(long)]
    pub listen_port: u16,
}

/// `meridian-tracker` (§4.5): the directory service miners and traders
/// register with.
#[derive(Debug, Parser)]
#[command(name = "meridian-tracker", about = "Peer directory service")]
pub struct TrackerArgs {
    /// Port the tracker listens on for miner and trader registrations.
    #[arg(long, default_value_t = default_tracker_port())]
    pub listen_port: u16,
}

/// `meridian-trader` (§4.6): a wallet client that submits transactions to
/// every known miner and reports the first admission result it receives.
#[derive(Debug, Parser)]
#[command(name = "meridian-trader", about = "Wallet client")]
pub struct TraderArgs {
    /// This wallet's address, registered with the tracker as active.
    #[arg(long)]
    pub wallet: String,

    /// Host the tracker is listening on.
    #[arg(long, default_value = "127.0.0.1")]
    pub tracker_host: String,

    /// Port the tracker is listening on.
    #[arg(long, default_value_t = default_tracker_port())]
    pub tracker_port: u16,

    /// This trader's nominal listen port, included in its tracker
    /// registration (§6.3). Peer-list and wallet-directory pushes arrive on
    /// the same connection the registration was sent on, so nothing actually
    /// binds this port.
    #[arg(long)]
    pub listen_port: u16,
}
