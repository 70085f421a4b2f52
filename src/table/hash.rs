//! Shard routing hash

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Shard that owns `key` in a table of `shard_count` shards
pub fn shard_index(key: &str, shard_count: usize) -> usize {
    (fnv1a_64(key.as_bytes()) % shard_count as u64) as usize
}
