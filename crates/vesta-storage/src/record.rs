//! Hidden hash column helpers.
//!
//! Under [`KeyKind::Hash`](crate::KeyKind::Hash) every stored record is the
//! encoded payload followed by an 8-byte little-endian SipHash-1-3 of that
//! payload.

use std::hash::Hasher;

use bytes::{BufMut, Bytes, BytesMut};
use siphasher::sip::SipHasher13;
use vesta_common::HASH_COLUMN_WIDTH;

use crate::error::{HandlerError, HandlerResult};

// Fixed keys keep hashes stable across tables, so a promoted table can reuse
// the stored column as is.
const HASH_KEY_0: u64 = 0x517c_c1b7_2722_0a95;
const HASH_KEY_1: u64 = 0x0fc9_4dc6_e6eb_8a5f;

/// Hashes an encoded record payload.
pub fn hash_payload(payload: &[u8]) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
    hasher.write(payload);
    hasher.finish()
}

/// Builds a stored record from a payload and its hash.
pub fn append_hash_column(payload: &[u8], hash: u64) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + HASH_COLUMN_WIDTH);
    buf.put_slice(payload);
    buf.put_u64_le(hash);
    buf.freeze()
}

/// Splits a stored record into its payload and hidden hash.
pub fn split_hash_column(record: &[u8]) -> HandlerResult<(&[u8], u64)> {
    if record.len() < HASH_COLUMN_WIDTH {
        return Err(HandlerError::corrupted(format!(
            "record of {} bytes has no hash column",
            record.len()
        )));
    }
    let (payload, hash) = record.split_at(record.len() - HASH_COLUMN_WIDTH);
    let mut raw = [0u8; HASH_COLUMN_WIDTH];
    raw.copy_from_slice(hash);
    Ok((payload, u64::from_le_bytes(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_payload(b"abc"), hash_payload(b"abc"));
        assert_ne!(hash_payload(b"abc"), hash_payload(b"abd"));
    }

    #[test]
    fn test_append_and_split() {
        let hash = hash_payload(b"row");
        let record = append_hash_column(b"row", hash);
        assert_eq!(record.len(), 3 + HASH_COLUMN_WIDTH);

        let (payload, stored) = split_hash_column(&record).unwrap();
        assert_eq!(payload, b"row");
        assert_eq!(stored, hash);
    }

    #[test]
    fn test_split_short_record() {
        let result = split_hash_column(b"abc");
        assert!(matches!(result, Err(HandlerError::Corrupted(_))));
    }
}
