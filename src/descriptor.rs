//! Serialized answers of the host type checker.
//!
//! The checker itself lives outside this crate. What reaches us is a flat
//! table of resolved types that reference each other by index, so cyclic
//! type graphs are representable without ownership cycles.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Index into [`DescriptorTable::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Category flags as reported by the checker. Several may be set at once
/// (`boolean` is also a `union` of its two literals, enum member literals are
/// `number`/`string` + `literal` + `enum_like`); precedence between them is
/// decided in [`crate::oracle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFlag {
    String,
    Number,
    Boolean,
    Any,
    Null,
    Undefined,
    Never,
    EnumLike,
    Union,
    Intersection,
    Object,
    Array,
    Literal,
    /// Anything the exporter knows about and we do not (`unknown`, `void`,
    /// type parameters, ...). Kept verbatim for the error message.
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberOrigin {
    /// Has at least one source declaration.
    #[default]
    Declared,
    /// No declaration, but the checker synthesized a type for it (members of
    /// mapped types such as `{ [K in Enum]?: T }`).
    Synthetic,
    /// Neither; skipped by the walker.
    Undeclared,
}

/// A documentation tag. Exporters may hand us either the raw `@key value`
/// line or the already split form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocTag {
    Raw(String),
    Parsed {
        name: String,
        #[serde(default)]
        text: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub origin: MemberOrigin,
    #[serde(default)]
    pub tags: Vec<DocTag>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub flags: Vec<TypeFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_symbol: Option<String>,
    /// Value of a string/number literal type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    /// `"true"`/`"false"` for boolean literal types, which carry no value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intrinsic_name: Option<String>,
    /// Union, intersection and enum constituents, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexKind>,
    /// Tags on the type (or alias) declaration itself.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<DocTag>,
}

impl Descriptor {
    pub fn has(&self, flag: &TypeFlag) -> bool {
        self.flags.contains(flag)
    }

    pub fn has_any(&self, flags: &[TypeFlag]) -> bool {
        flags.iter().any(|f| self.has(f))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorTable {
    pub types: Vec<Descriptor>,
    /// Exported names, for looking types up from the command line.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub roots: IndexMap<String, TypeId>,
}

impl DescriptorTable {
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> Result<&Descriptor> {
        self.types.get(id.0 as usize).ok_or(Error::UnknownType(id))
    }

    pub fn root(&self, name: &str) -> Option<TypeId> {
        self.roots.get(name).copied()
    }
}
