//! API clients for watching a fleet of consensus/execution layer test nodes.
//!
//! Nothing here participates in any protocol: the clients issue read-only
//! beacon API and execution JSON-RPC requests against already-running nodes
//! and hand back raw JSON plus typed extractors. All transport failures are
//! classified into the closed [`TransportError`] taxonomy so callers can
//! bucket nodes instead of propagating errors.

mod error;
mod node;

pub mod beacon;
pub mod execution;

pub use error::TransportError;
pub use node::Node;

pub type Result<T> = std::result::Result<T, TransportError>;

/// The all-zero parent root that terminates a backward chain walk.
pub const ZERO_ROOT: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Shorten a root to its last 8 hex characters for display.
///
/// Display-only: comparison keys must always use the full root.
pub fn truncate_root(root: &str) -> String {
    let hex_part = root.strip_prefix("0x").unwrap_or(root);
    let tail = if hex_part.len() > 8 {
        &hex_part[hex_part.len() - 8..]
    } else {
        hex_part
    };
    format!("0x{}", tail)
}

/// Decode a hex graffiti field to text, stripping trailing NUL padding.
///
/// Proposers pad graffiti to 32 bytes with NULs; undecodable input is
/// returned unchanged.
pub fn decode_graffiti(graffiti: &str) -> String {
    let stripped = graffiti.strip_prefix("0x").unwrap_or(graffiti);
    match hex::decode(stripped) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).replace('\0', ""),
        Err(_) => graffiti.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_root() {
        let root = "0x93247f2209abcacf57b75a51dafae777f9dd38bc7053d1af526f220a7489a6d3";
        assert_eq!(truncate_root(root), "0x7489a6d3");
    }

    #[test]
    fn test_truncate_root_short() {
        assert_eq!(truncate_root("0xabcd"), "0xabcd");
    }

    #[test]
    fn test_decode_graffiti() {
        // "prysm" followed by NUL padding
        let graffiti = "0x707279736d0000000000000000000000000000000000000000000000000000000000";
        assert_eq!(decode_graffiti(graffiti), "prysm");
    }

    #[test]
    fn test_decode_graffiti_invalid_hex() {
        assert_eq!(decode_graffiti("0xzz"), "0xzz");
    }
}
