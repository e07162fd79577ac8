//! Ordered byte keys for the sled trees
//!
//! Row keys are `well_id (8) | depth (8) | seq (8)`, all big-endian, so a
//! prefix scan over one well walks its rows in ascending depth and rows that
//! share a depth stay in ingestion order.

/// Map an `f64` onto `u64` bytes whose lexicographic order matches numeric order.
///
/// Positive values get the sign bit set; negative values are inverted.
/// `-0.0` is folded onto `0.0` so both land on the same key.
pub fn encode_depth(depth: f64) -> [u8; 8] {
    let depth = if depth == 0.0 { 0.0 } else { depth };
    let bits = depth.to_bits();
    let ordered = if bits >> 63 == 1 { !bits } else { bits | (1 << 63) };
    ordered.to_be_bytes()
}

pub fn decode_depth(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered >> 63 == 1 { ordered & !(1 << 63) } else { !ordered };
    f64::from_bits(bits)
}

pub fn well_key(well_id: u64) -> [u8; 8] {
    well_id.to_be_bytes()
}

pub fn curve_key(well_id: u64, curve_index: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&well_id.to_be_bytes());
    key[8..].copy_from_slice(&curve_index.to_be_bytes());
    key
}

pub fn row_key(well_id: u64, depth: f64, seq: u64) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&well_id.to_be_bytes());
    key[8..16].copy_from_slice(&encode_depth(depth));
    key[16..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Inclusive key bounds covering every row of `well_id` with depth in `[start, end]`
pub fn row_range(well_id: u64, start: f64, end: f64) -> ([u8; 24], [u8; 24]) {
    (row_key(well_id, start, 0), row_key(well_id, end, u64::MAX))
}
