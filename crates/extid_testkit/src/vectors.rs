//! Golden vectors for the stored layouts.
//!
//! Any change to these bytes changes the on-disk format and must come
//! with an `INDEX_VERSION` bump.

use serde::{Deserialize, Serialize};

/// A named byte layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Expected bytes (hex-encoded).
    pub expected_hex: String,
}

impl TestVector {
    fn new(id: &str, description: &str, expected_hex: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_hex: expected_hex.into(),
        }
    }
}

/// Value layouts of detached records.
pub fn record_value_vectors() -> Vec<TestVector> {
    vec![
        TestVector::new(
            "value_group_user",
            "base.group_user: User / res.groups / base, no subtype",
            "000455736572000a7265732e67726f75707300046261736500",
        ),
        TestVector::new(
            "value_qweb_view",
            "web view: Layout / ir.ui.view / web, qweb subtype",
            "00064c61796f7574000a69722e75692e76696577000377656201",
        ),
        TestVector::new(
            "value_empty_name",
            "empty name / ir.model / sale",
            "0000000869722e6d6f64656c000473616c6500",
        ),
    ]
}

/// Complete log frames, envelope and checksum included.
pub fn frame_vectors() -> Vec<TestVector> {
    vec![
        TestVector::new(
            "frame_removed",
            "FileRemoved for /addons/base/data/res.groups.csv",
            "022200000000202f6164646f6e732f626173652f646174612f7265732e67726f7570732e6373760e98af38",
        ),
        TestVector::new(
            "frame_indexed_one",
            "FileIndexed with hash 0x11.. and base.group_user",
            "017000000000202f6164646f6e732f626173652f646174612f7265732e67726f7570732e637376\
             1111111111111111111111111111111111111111111111111111111111111111\
             01000000000f626173652e67726f75705f75736572\
             000455736572000a7265732e67726f757073000462617365005fad337a",
        ),
        TestVector::new(
            "frame_indexed_empty",
            "FileIndexed with a zero hash and no entries",
            "0142000000001c2f6164646f6e732f73616c652f76696577732f656d7074792e786d6c\
             0000000000000000000000000000000000000000000000000000000000000000\
             000000008c5b853f",
        ),
    ]
}

/// Exports every vector as pretty JSON.
pub fn all_vectors_json() -> String {
    let mut all = record_value_vectors();
    all.extend(frame_vectors());
    serde_json::to_string_pretty(&all).unwrap_or_default()
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes lowercase or uppercase hex. Panics on malformed input.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "odd hex length");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}
