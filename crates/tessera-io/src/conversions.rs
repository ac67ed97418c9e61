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

//! Custom field conversions for persisted records.
//!
//! Each submodule is meant for `#[serde(with = "...")]` and fixes the textual
//! form of one field type:
//!
//! * [`hex_uuid`]: an [`AssetUUID`] as 32 lowercase hexadecimal characters.
//! * [`ticks`]: a [`SystemTime`] as a signed count of 100 ns ticks since the
//!   Unix epoch.
//! * [`base64_blob`]: a byte buffer as standard base64 text.
//!
//! [`AssetUUID`]: tessera_core::asset::AssetUUID
//! [`SystemTime`]: std::time::SystemTime

/// `AssetUUID` <-> 32 hex characters without separators.
pub mod hex_uuid {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use tessera_core::asset::AssetUUID;

    /// Writes the identifier as hex text.
    pub fn serialize<S: Serializer>(id: &AssetUUID, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    /// Reads an identifier from hex text.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AssetUUID, D::Error> {
        let text = String::deserialize(deserializer)?;
        AssetUUID::from_hex(&text).map_err(de::Error::custom)
    }
}

/// `SystemTime` <-> signed count of 100 ns ticks since the Unix epoch.
pub mod ticks {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    /// Number of ticks in one second.
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
    const NANOS_PER_TICK: u32 = 100;

    /// Converts a point in time to ticks, truncating below tick resolution.
    ///
    /// Times too far from the epoch to fit saturate at the `i64` bounds.
    pub fn to_ticks(time: SystemTime) -> i64 {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => duration_to_ticks(after),
            Err(before) => duration_to_ticks(before.duration()).saturating_neg(),
        }
    }

    /// Converts ticks back to a point in time.
    ///
    /// Returns `None` if the platform cannot represent the instant.
    pub fn from_ticks(ticks: i64) -> Option<SystemTime> {
        let magnitude = ticks.unsigned_abs();
        let per_second = TICKS_PER_SECOND as u64;
        let offset = Duration::new(
            magnitude / per_second,
            (magnitude % per_second) as u32 * NANOS_PER_TICK,
        );
        if ticks >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }

    fn duration_to_ticks(duration: Duration) -> i64 {
        let ticks = duration.as_nanos() / u128::from(NANOS_PER_TICK);
        i64::try_from(ticks).unwrap_or(i64::MAX)
    }

    /// Writes the time as an integer tick count.
    pub fn serialize<S: Serializer>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(to_ticks(*time))
    }

    /// Reads a time from an integer tick count.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SystemTime, D::Error> {
        let ticks = i64::deserialize(deserializer)?;
        from_ticks(ticks)
            .ok_or_else(|| de::Error::custom(format!("tick count {ticks} is out of range")))
    }
}

/// Byte buffer <-> standard base64 text.
pub mod base64_blob {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Writes the bytes as base64 text.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Reads bytes from base64 text.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text.as_bytes()).map_err(de::Error::custom)
    }
}
