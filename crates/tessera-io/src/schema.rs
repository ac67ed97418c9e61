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

//! Compile-time record schemas and their process-wide cache.
//!
//! A persisted type describes its top-level fields once through [`Record`].
//! The first time a type is saved or loaded, [`SchemaCache`] builds a
//! [`RecordSchema`] for it and keeps it for the lifetime of the process. The
//! schema is used to check the shape of stored text before it is decoded and
//! to produce default instances.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// The textual representation expected for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A non-negative integer.
    Unsigned,
    /// A signed integer.
    Signed,
    /// `true` or `false`.
    Boolean,
    /// A unit enum variant.
    Enum,
    /// An identifier stored as 32 hex characters.
    HexId,
    /// A point in time stored as 100 ns ticks.
    Ticks,
    /// A byte buffer stored as base64 text.
    Base64Blob,
    /// Free text.
    Text,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Unsigned => "unsigned integer",
            FieldKind::Signed => "signed integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum => "enum variant",
            FieldKind::HexId => "hex identifier",
            FieldKind::Ticks => "tick count",
            FieldKind::Base64Blob => "base64 blob",
            FieldKind::Text => "text",
        };
        f.write_str(name)
    }
}

impl FieldKind {
    /// Returns `true` if a stored value of this shape can hold the kind.
    pub fn accepts(self, shape: ValueShape) -> bool {
        match self {
            FieldKind::Unsigned => shape == ValueShape::Integer { negative: false },
            FieldKind::Signed | FieldKind::Ticks => matches!(shape, ValueShape::Integer { .. }),
            FieldKind::Boolean => shape == ValueShape::Boolean,
            FieldKind::Enum => matches!(
                shape,
                ValueShape::Identifier | ValueShape::Sequence | ValueShape::Structure
            ),
            FieldKind::HexId | FieldKind::Base64Blob | FieldKind::Text => shape == ValueShape::Text,
        }
    }
}

/// The syntactic shape of a stored value, as seen before typed decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// An integer literal.
    Integer {
        /// Whether the literal is below zero.
        negative: bool,
    },
    /// A floating-point literal.
    Float,
    /// `true` or `false`.
    Boolean,
    /// A string or character literal.
    Text,
    /// A bare identifier such as a unit variant, or `()`.
    Identifier,
    /// A list or tuple.
    Sequence,
    /// A map or a struct with named fields.
    Structure,
    /// A byte string.
    Bytes,
    /// `None`.
    Absent,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Integer { negative: true } => "a negative integer",
            ValueShape::Integer { negative: false } => "an integer",
            ValueShape::Float => "a float",
            ValueShape::Boolean => "a boolean",
            ValueShape::Text => "text",
            ValueShape::Identifier => "an identifier",
            ValueShape::Sequence => "a sequence",
            ValueShape::Structure => "a structure",
            ValueShape::Bytes => "a byte string",
            ValueShape::Absent => "`None`",
        };
        f.write_str(name)
    }
}

/// Describes one top-level field of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The field name as written in the stored text.
    pub name: &'static str,
    /// The expected representation.
    pub kind: FieldKind,
    /// Whether the field must be present.
    pub required: bool,
}

impl FieldDescriptor {
    /// A field that must appear in every stored instance.
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    /// A field that may be omitted; the type's default is used instead.
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A type that can be persisted as a structured-text record.
///
/// Implementors are plain serde structs; `fields` must list exactly the
/// top-level fields they serialize.
pub trait Record: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// The name used in logs and errors.
    const TYPE_NAME: &'static str;

    /// The top-level fields of the record.
    fn fields() -> &'static [FieldDescriptor];
}

type DefaultFactory = fn() -> Box<dyn Any + Send + Sync>;

fn default_boxed<T: Record>() -> Box<dyn Any + Send + Sync> {
    Box::new(T::default())
}

/// The cached description of one [`Record`] type.
pub struct RecordSchema {
    type_name: &'static str,
    fields: &'static [FieldDescriptor],
    factory: DefaultFactory,
}

impl RecordSchema {
    fn of<T: Record>() -> Self {
        Self {
            type_name: T::TYPE_NAME,
            fields: T::fields(),
            factory: default_boxed::<T>,
        }
    }

    /// The record's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Every field descriptor, in declaration order.
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Builds a default instance through the cached factory.
    ///
    /// Returns `None` if `T` is not the type this schema was built for.
    pub fn instantiate<T: Record>(&self) -> Option<T> {
        (self.factory)().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Checks the stored top-level fields, given as name and value shape,
    /// against the schema.
    ///
    /// # Errors
    /// Describes the first duplicated, unknown or ill-shaped field, or the
    /// first missing required one.
    pub fn check_fields<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a str, ValueShape)>,
    ) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (name, shape) in fields {
            let Some(descriptor) = self.field(name) else {
                return Err(format!("unknown field `{name}`"));
            };
            if !seen.insert(name) {
                return Err(format!("duplicate field `{name}`"));
            }
            if !descriptor.kind.accepts(shape) {
                return Err(format!(
                    "field `{name}` holds {shape}, expected {}",
                    descriptor.kind
                ));
            }
        }

        match self
            .fields
            .iter()
            .find(|f| f.required && !seen.contains(f.name))
        {
            Some(missing) => Err(format!(
                "missing field `{}` ({})",
                missing.name, missing.kind
            )),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// The process-wide cache of record schemas, keyed by type.
///
/// Schemas are built lazily on first use and never invalidated. Reads take a
/// shared lock; only the first use of a type takes the exclusive one.
pub struct SchemaCache;

impl SchemaCache {
    fn registry() -> &'static RwLock<HashMap<TypeId, Arc<RecordSchema>>> {
        static SCHEMAS: OnceLock<RwLock<HashMap<TypeId, Arc<RecordSchema>>>> = OnceLock::new();
        SCHEMAS.get_or_init(|| RwLock::new(HashMap::new()))
    }

    /// Returns the schema of `T`, building it on first use.
    pub fn get<T: Record>() -> Arc<RecordSchema> {
        let key = TypeId::of::<T>();
        if let Some(schema) = Self::registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return schema.clone();
        }

        let mut schemas = Self::registry()
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        schemas
            .entry(key)
            .or_insert_with(|| {
                log::debug!("Building record schema for {}", T::TYPE_NAME);
                Arc::new(RecordSchema::of::<T>())
            })
            .clone()
    }

    /// Returns `true` if the schema of `T` has already been built.
    pub fn contains<T: Record>() -> bool {
        Self::registry()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }
}
