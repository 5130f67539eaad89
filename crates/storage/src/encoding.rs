// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload encodings for stored trigger documents.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// zstd level 3 is the library default and plenty for small JSON blobs.
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingType {
    Plain,
    #[default]
    Zstd,
}

impl EncodingType {
    pub fn encode(self, json: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self {
            EncodingType::Plain => Ok(json.to_vec()),
            EncodingType::Zstd => zstd::encode_all(json, COMPRESSION_LEVEL)
                .map_err(|e| StoreError::Compression(e.to_string())),
        }
    }

    pub fn decode(self, payload: &[u8]) -> Result<Vec<u8>, StoreError> {
        match self {
            EncodingType::Plain => Ok(payload.to_vec()),
            EncodingType::Zstd => {
                zstd::decode_all(payload).map_err(|e| StoreError::Compression(e.to_string()))
            }
        }
    }
}

impl fmt::Display for EncodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EncodingType::Plain => "plain",
            EncodingType::Zstd => "zstd",
        })
    }
}

#[cfg(test)]
#[path = "encoding_tests.rs"]
mod tests;
