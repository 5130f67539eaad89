// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn zstd_shrinks_repetitive_documents() {
    let json = serde_json::to_vec(&vec!["BasicTimeChecker_1.eval()"; 64]).unwrap();
    let packed = EncodingType::Zstd.encode(&json).unwrap();
    assert!(packed.len() < json.len());
    assert_eq!(EncodingType::Zstd.decode(&packed).unwrap(), json);
}

#[test]
fn plain_is_passthrough() {
    let json = br#"{"a":1}"#;
    assert_eq!(EncodingType::Plain.encode(json).unwrap(), json.to_vec());
    assert_eq!(EncodingType::Plain.decode(json).unwrap(), json.to_vec());
}

#[test]
fn garbage_is_a_compression_error() {
    let err = EncodingType::Zstd.decode(b"not zstd").unwrap_err();
    assert!(matches!(err, StoreError::Compression(_)));
}

#[yare::parameterized(
    plain = { EncodingType::Plain, "\"plain\"" },
    zstd  = { EncodingType::Zstd,  "\"zstd\"" },
)]
fn serializes_lowercase(encoding: EncodingType, expected: &str) {
    assert_eq!(serde_json::to_string(&encoding).unwrap(), expected);
}
