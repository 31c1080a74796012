/// Identifier and timestamp helpers.
///
/// Element, edge and board ids are `<prefix>-<8 hex chars>`. The hex part is
/// derived from an atomic counter and a nanosecond timestamp hashed through
/// SHA-256, so ids are unique within the process and evenly distributed.
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh id with the given prefix (`el`, `edge`, `board`).
pub fn generate_id(prefix: &str) -> String {
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(seq.to_le_bytes());
    hasher.update(ts.to_le_bytes());
    let hash = hasher.finalize();
    format!("{}-{}", prefix, hex::encode(&hash[..4]))
}

/// Stable id for the subtask found on `line_index` of an element's content.
/// The same element and line always yield the same id.
pub fn subtask_id(element_id: &str, line_index: usize) -> String {
    format!("{}:L{}", element_id, line_index)
}

/// Milliseconds since the unix epoch.
pub fn timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id("el");
        assert!(id.starts_with("el-"));
        let hex_part = &id[3..];
        assert_eq!(hex_part.len(), 8);
        assert!(hex_part.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("edge");
        let b = generate_id("edge");
        assert_ne!(a, b);
    }

    #[test]
    fn test_subtask_id_stable() {
        assert_eq!(subtask_id("card-1", 3), subtask_id("card-1", 3));
        assert_ne!(subtask_id("card-1", 3), subtask_id("card-1", 4));
    }
}
