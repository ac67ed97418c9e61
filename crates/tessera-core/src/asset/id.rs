// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace used to derive deterministic identifiers from source paths.
const ASSET_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_83d5_4b0f_9e6a_12c7_d0b3_5e81);

/// A globally unique, persistent identifier for a logical asset.
///
/// This UUID represents the "idea" of an asset, completely decoupled from its
/// physical file path. It is the key of every cache entry the pipeline writes.
///
/// When used as a file or directory name the identifier is rendered as 32
/// lowercase hexadecimal characters with no separators (see [`AssetUUID::to_hex`]).
/// Equality is bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetUUID(Uuid);

impl AssetUUID {
    /// Creates a new, random (version 4) `AssetUUID`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic (version 5) `AssetUUID` from a name, usually a
    /// project-relative source path.
    pub fn new_v5(name: &str) -> Self {
        Self(Uuid::new_v5(&ASSET_NAMESPACE, name.as_bytes()))
    }

    /// Wraps a raw 128-bit value.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Returns the raw 128-bit value.
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Renders the identifier as 32 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        self.0.simple().to_string()
    }

    /// Parses an identifier previously rendered by [`to_hex`](Self::to_hex).
    ///
    /// Exactly 32 hexadecimal characters are accepted; hyphenated or braced
    /// forms are rejected so that a file name always maps to a single id.
    pub fn from_hex(text: &str) -> Result<Self, ParseAssetUUIDError> {
        if text.len() != 32 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseAssetUUIDError {
                input: text.to_string(),
            });
        }
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|_| ParseAssetUUIDError {
                input: text.to_string(),
            })
    }
}

impl Default for AssetUUID {
    /// Creates a new, random (version 4) `AssetUUID`.
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetUUID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for AssetUUID {
    type Err = ParseAssetUUIDError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Returned when a string is not a 32-character hexadecimal identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAssetUUIDError {
    input: String,
}

impl fmt::Display for ParseAssetUUIDError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a 32-character hexadecimal asset identifier",
            self.input
        )
    }
}

impl std::error::Error for ParseAssetUUIDError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_without_separators() {
        let id = AssetUUID::from_u128(0x0123_4567_89AB_CDEF_0123_4567_89AB_CDEF);
        assert_eq!(id.to_hex(), "0123456789abcdef0123456789abcdef");
        assert_eq!(id.to_string(), id.to_hex());
    }

    #[test]
    fn hex_parses_back_to_same_bits() {
        let id = AssetUUID::new();
        let parsed = AssetUUID::from_hex(&id.to_hex()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.as_u128(), id.as_u128());
    }

    #[test]
    fn hyphenated_form_is_rejected() {
        let id = AssetUUID::new();
        let hyphenated = id.0.hyphenated().to_string();
        assert!(AssetUUID::from_hex(&hyphenated).is_err());
        assert!("not-an-id".parse::<AssetUUID>().is_err());
    }

    #[test]
    fn v5_is_deterministic_per_name() {
        assert_eq!(
            AssetUUID::new_v5("textures/brick.jpg"),
            AssetUUID::new_v5("textures/brick.jpg")
        );
        assert_ne!(
            AssetUUID::new_v5("textures/brick.jpg"),
            AssetUUID::new_v5("textures/stone.jpg")
        );
    }
}
