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

//! Saving and loading [`Record`]s as RON text.
//!
//! Records are written pretty-printed with two-space indentation. On load,
//! the text goes through three checks before a value is returned: it must be
//! valid RON (otherwise [`PersistenceError::Malformed`]), its top level must
//! be a struct whose field names and value shapes match the cached
//! [`RecordSchema`], and it must decode into the requested type (otherwise
//! [`PersistenceError::TypeMismatch`]). RON comments are accepted anywhere.
//!
//! [`RecordSchema`]: crate::schema::RecordSchema

use crate::error::PersistenceError;
use crate::schema::{Record, SchemaCache, ValueShape};
use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Renders `record` as pretty RON.
pub fn to_ron<T: Record>(record: &T) -> Result<String, PersistenceError> {
    let pretty = ron::ser::PrettyConfig::default().indentor("  ".to_string());
    ron::ser::to_string_pretty(record, pretty).map_err(|e| PersistenceError::Serialize {
        type_name: T::TYPE_NAME,
        detail: e.to_string(),
    })
}

/// Parses RON text into a `T`, checking its shape against the cached schema.
///
/// `origin` names the text's source in errors.
pub fn from_ron<T: Record>(text: &str, origin: &Path) -> Result<T, PersistenceError> {
    ron::from_str::<IgnoredAny>(text).map_err(|e| PersistenceError::Malformed {
        path: origin.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mismatch = |detail: String| PersistenceError::TypeMismatch {
        path: origin.to_path_buf(),
        type_name: T::TYPE_NAME,
        detail,
    };

    let schema = SchemaCache::get::<T>();
    let fields = top_level_fields(text, T::TYPE_NAME).map_err(mismatch)?;
    schema
        .check_fields(fields.iter().map(|(name, shape)| (name.as_str(), *shape)))
        .map_err(mismatch)?;

    ron::from_str::<T>(text).map_err(|e| mismatch(e.code.to_string()))
}

/// Writes `record` to `path`, creating missing parent directories.
///
/// An existing file is replaced.
pub fn save<T: Record>(path: &Path, record: &T) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }
    let text = to_ron(record)?;
    fs::write(path, text).map_err(|e| PersistenceError::io(path, e))?;
    log::debug!("Saved {} to '{}'", T::TYPE_NAME, path.display());
    Ok(())
}

/// Reads a `T` previously written by [`save`].
pub fn load<T: Record>(path: &Path) -> Result<T, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
    let record = from_ron(&text, path)?;
    log::debug!("Loaded {} from '{}'", T::TYPE_NAME, path.display());
    Ok(record)
}

/// Reads a `T` from `path`, or returns the type's default instance if the
/// file does not exist.
///
/// Any other failure, including a malformed file, is still reported.
pub fn load_or_default<T: Record>(path: &Path) -> Result<T, PersistenceError> {
    match load(path) {
        Err(PersistenceError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            log::debug!(
                "No {} at '{}', using defaults",
                T::TYPE_NAME,
                path.display()
            );
            Ok(SchemaCache::get::<T>().instantiate().unwrap_or_default())
        }
        other => other,
    }
}

/// Collects the top-level fields of a struct-shaped RON document, with the
/// shape of each value.
fn top_level_fields(
    text: &str,
    type_name: &'static str,
) -> Result<Vec<(String, ValueShape)>, String> {
    let mut deserializer = ron::Deserializer::from_str(text).map_err(|e| e.to_string())?;
    let fields = deserializer
        .deserialize_struct(type_name, &[], FieldShapes)
        .map_err(|e| e.to_string())?;
    deserializer.end().map_err(|e| e.to_string())?;
    Ok(fields)
}

struct FieldShapes;

impl<'de> Visitor<'de> for FieldShapes {
    type Value = Vec<(String, ValueShape)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a struct with named fields")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut fields = Vec::new();
        while let Some(name) = map.next_key::<String>()? {
            let Shape(shape) = map.next_value()?;
            fields.push((name, shape));
        }
        Ok(fields)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Vec::new())
    }
}

/// Deserializes any value, keeping only its [`ValueShape`].
struct Shape(ValueShape);

impl<'de> Deserialize<'de> for Shape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ShapeVisitor).map(Shape)
    }
}

struct ShapeVisitor;

impl<'de> Visitor<'de> for ShapeVisitor {
    type Value = ValueShape;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<ValueShape, E> {
        Ok(ValueShape::Boolean)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ValueShape, E> {
        Ok(ValueShape::Integer { negative: v < 0 })
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<ValueShape, E> {
        Ok(ValueShape::Integer { negative: v < 0 })
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<ValueShape, E> {
        Ok(ValueShape::Integer { negative: false })
    }

    fn visit_u128<E: de::Error>(self, _: u128) -> Result<ValueShape, E> {
        Ok(ValueShape::Integer { negative: false })
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<ValueShape, E> {
        Ok(ValueShape::Float)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<ValueShape, E> {
        Ok(ValueShape::Text)
    }

    fn visit_bytes<E: de::Error>(self, _: &[u8]) -> Result<ValueShape, E> {
        Ok(ValueShape::Bytes)
    }

    fn visit_unit<E: de::Error>(self) -> Result<ValueShape, E> {
        // RON hands bare identifiers such as unit variants over as unit.
        Ok(ValueShape::Identifier)
    }

    fn visit_none<E: de::Error>(self) -> Result<ValueShape, E> {
        Ok(ValueShape::Absent)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<ValueShape, D::Error> {
        deserializer.deserialize_any(ShapeVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ValueShape, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(ValueShape::Sequence)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ValueShape, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(ValueShape::Structure)
    }
}
