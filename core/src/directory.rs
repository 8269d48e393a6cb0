//! Wire formats used by the tracker's directory broadcasts (§6.2, §6.3):
//! the peer-list packet and the wallet packet. Both are plain delimited
//! strings rather than JSON, matching the original protocol's wire format
//! exactly.

/// Format a peer list as `('<ip>', '<port>')` tuples joined by `;`, mirroring
/// the Python tuple `repr()` the original tracker produces for
/// `(peer.getpeername()[0], peer.listening_port)`.
pub fn format_peer_list(peers: &[(String, String)]) -> String {
    peers
        .iter()
        .map(|(ip, port)| format!("('{ip}', '{port}')"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a peer-list packet back into `(ip, port)` pairs. Tolerates the
/// empty string (no peers) by returning an empty vector.
pub fn parse_peer_list(payload: &str) -> Vec<(String, String)> {
    if payload.is_empty() {
        return Vec::new();
    }
    payload
        .split(';')
        .filter_map(parse_peer_tuple)
        .collect()
}

fn parse_peer_tuple(segment: &str) -> Option<(String, String)> {
    let trimmed = segment.trim().trim_start_matches('(').trim_end_matches(')');
    let mut parts = trimmed.splitn(2, ", ");
    let ip = parts.next()?.trim_matches('\'').to_string();
    let port = parts.next()?.trim_matches('\'').to_string();
    Some((ip, port))
}

/// Format the combined wallet packet: comma-joined `all_wallets`, a `;`, then
/// comma-joined `active_wallets` (§6.3).
pub fn format_wallet_packet(all_wallets: &[String], active_wallets: &[String]) -> String {
    format!("{};{}", all_wallets.join(","), active_wallets.join(","))
}

/// Parse a wallet packet, splitting on the first `;` then each half on `,`.
/// Empty entries (a leading/trailing comma, or an empty half) are discarded
/// rather than producing spurious empty-string wallet addresses.
pub fn parse_wallet_packet(payload: &str) -> (Vec<String>, Vec<String>) {
    let (all_part, active_part) = payload.split_once(';').unwrap_or((payload, ""));
    (split_nonempty(all_part), split_nonempty(active_part))
}

fn split_nonempty(part: &str) -> Vec<String> {
    part.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_list_round_trip() {
        let peers = vec![
            ("127.0.0.1".to_string(), "6000".to_string()),
            ("10.0.0.2".to_string(), "6001".to_string()),
        ];
        let wire = format_peer_list(&peers);
        assert_eq!(wire, "('127.0.0.1', '6000');('10.0.0.2', '6001')");
        assert_eq!(parse_peer_list(&wire), peers);
    }

    #[test]
    fn empty_peer_list_round_trips() {
        assert_eq!(format_peer_list(&[]), "");
        assert_eq!(parse_peer_list(""), Vec::<(String, String)>::new());
    }

    #[test]
    fn wallet_packet_round_trip() {
        let all = vec!["alice".to_string(), "bob".to_string()];
        let active = vec!["alice".to_string()];
        let wire = format_wallet_packet(&all, &active);
        assert_eq!(wire, "alice,bob;alice");
        assert_eq!(parse_wallet_packet(&wire), (all, active));
    }

    #[test]
    fn wallet_packet_discards_empty_entries() {
        let (all, active) = parse_wallet_packet(";");
        assert!(all.is_empty());
        assert!(active.is_empty());

        let (all, active) = parse_wallet_packet("alice,,bob;");
        assert_eq!(all, vec!["alice".to_string(), "bob".to_string()]);
        assert!(active.is_empty());
    }
}
