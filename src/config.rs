//! Walker and locator configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config file.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStyle {
    /// `{type:"object", props:{...}}` below the top level.
    #[default]
    Wrapped,
    /// Bare property maps at every depth.
    Flat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayItems {
    /// Emit `items` for typed arrays.
    #[default]
    Tracked,
    /// Always `{type:"array"}`.
    Opaque,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafStyle {
    /// `{type:"string", ...}` nodes.
    #[default]
    Typed,
    /// Leaves are the bare type name (`"string"`, `"array"`); list entries
    /// stay `{type:...}`. No markers or annotations fit on a string.
    Bare,
}

/// Output mode. The historical output flavours are combinations of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mode {
    pub objects: ObjectStyle,
    pub annotations: bool,
    pub array_items: ArrayItems,
    pub leaves: LeafStyle,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            objects: ObjectStyle::Wrapped,
            annotations: true,
            array_items: ArrayItems::Tracked,
            leaves: LeafStyle::Typed,
        }
    }
}

impl Mode {
    /// The eight typed-leaf combinations, for running one scenario against
    /// each. Bare leaves change every leaf and are exercised on their own.
    pub fn all() -> Vec<Mode> {
        let mut out = Vec::with_capacity(8);
        for objects in [ObjectStyle::Wrapped, ObjectStyle::Flat] {
            for annotations in [true, false] {
                for array_items in [ArrayItems::Tracked, ArrayItems::Opaque] {
                    out.push(Mode { objects, annotations, array_items, leaves: LeafStyle::Typed });
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the designated schema-producing function.
    pub function_name: String,
    /// If set, the resolved declaration's file must end with this path.
    pub module: Option<String>,
    /// Marker type symbol → schema type name.
    pub predefined: IndexMap<String, String>,
    /// Symbol names that do not identify a type (anonymous literals, the
    /// array pseudo-symbol) and therefore never enter the ancestor set.
    pub anonymous_symbols: Vec<String>,
    /// Hard stop for nesting that no named cycle check can end.
    pub max_depth: usize,
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        let predefined = [
            ("IEmail", "email"),
            ("IDate", "date"),
            ("IForbidden", "forbidden"),
            ("IUrl", "url"),
            ("IUUID", "uuid"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            function_name: "schema".into(),
            module: None,
            predefined,
            anonymous_symbols: vec!["__type".into(), "__object".into(), "Array".into()],
            max_depth: 256,
            mode: Mode::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;
        crate::path_de::from_str_with_path(&src)
    }

    pub fn is_anonymous(&self, symbol: &str) -> bool {
        self.anonymous_symbols.iter().any(|s| s == symbol)
    }
}
