//! Schema fragments: the output tree of the walker.
//!
//! Strongly typed while being built; rendered to `serde_json::Value` only at
//! the end. Key order of the rendered object is stable: `type`, the body
//! (`values` / `items` / `props`), `optional`, then annotation extras.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::oracle::LiteralValue;

/// Annotation-derived key/value pairs merged next to `type`.
pub type Extras = IndexMap<String, Value>;

/// Property name → fragment, in declaration order.
pub type Props = IndexMap<String, Fragment>;

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// `{}`: no type argument, or an object without resolvable members.
    Empty,
    Node(Node),
    /// Unwrapped property map (top level, or everywhere in flat mode).
    Props { props: Props, extras: Extras },
    /// Union branches. A list has no keys of its own, so markers go on the
    /// entries.
    Alternatives(Vec<Fragment>),
    /// Bare type name, e.g. `"string"`. Inside a list it renders as
    /// `{type: name}`.
    Bare(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub optional: bool,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `string`, `number`, `boolean`, `any` or a predefined alias name.
    Primitive(String),
    Forbidden,
    Enum(Vec<LiteralValue>),
    Array(Option<Box<Fragment>>),
    /// `None` is the opaque `{type:"object"}` used for dictionaries.
    Object(Option<Props>),
}

impl Fragment {
    fn node(kind: NodeKind) -> Self {
        Fragment::Node(Node { kind, optional: false, extras: Extras::new() })
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::node(NodeKind::Primitive(name.into()))
    }

    pub fn forbidden() -> Self {
        Self::node(NodeKind::Forbidden)
    }

    pub fn enumeration(values: Vec<LiteralValue>) -> Self {
        Self::node(NodeKind::Enum(values))
    }

    pub fn array(items: Option<Fragment>) -> Self {
        Self::node(NodeKind::Array(items.map(Box::new)))
    }

    pub fn object(props: Props) -> Self {
        Self::node(NodeKind::Object(Some(props)))
    }

    pub fn opaque_object() -> Self {
        Self::node(NodeKind::Object(None))
    }

    pub fn flat(props: Props) -> Self {
        Fragment::Props { props, extras: Extras::new() }
    }

    /// Mark the slot optional. Lists mark every entry; forbidden fragments,
    /// flat maps, bare names and `{}` have nowhere to put the marker and stay
    /// as they are.
    pub fn optional(self, optional: bool) -> Self {
        if !optional {
            return self;
        }
        match self {
            Fragment::Node(mut node) if node.kind != NodeKind::Forbidden => {
                node.optional = true;
                Fragment::Node(node)
            }
            Fragment::Alternatives(entries) => {
                Fragment::Alternatives(entries.into_iter().map(|e| e.optional(true)).collect())
            }
            other => other,
        }
    }

    /// Whether member annotations can be merged at the level of `type`.
    /// A flat property map has no such level: its keys are property names.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Fragment::Node(_) | Fragment::Empty)
    }

    /// Collapse typed leaves to their bare type name, at every depth.
    /// Objects with properties keep their structure.
    pub fn into_bare(self) -> Self {
        match self {
            Fragment::Node(node) => match node.kind {
                NodeKind::Object(Some(props)) => Fragment::Node(Node {
                    kind: NodeKind::Object(Some(bare_props(props))),
                    ..node
                }),
                kind => Fragment::Bare(kind.type_name().to_string()),
            },
            Fragment::Props { props, extras } => Fragment::Props { props: bare_props(props), extras },
            Fragment::Alternatives(entries) => {
                Fragment::Alternatives(entries.into_iter().map(Fragment::into_bare).collect())
            }
            other => other,
        }
    }

    /// Merge extras at the level of `type`. Later keys overwrite earlier ones.
    /// Lists and bare names are returned untouched.
    pub fn with_extras(self, extras: &Extras) -> Self {
        if extras.is_empty() {
            return self;
        }
        match self {
            Fragment::Empty => Fragment::Props { props: Props::new(), extras: extras.clone() },
            Fragment::Node(mut node) => {
                extend(&mut node.extras, extras);
                Fragment::Node(node)
            }
            Fragment::Props { props, extras: mut own } => {
                extend(&mut own, extras);
                Fragment::Props { props, extras: own }
            }
            other @ (Fragment::Alternatives(_) | Fragment::Bare(_)) => other,
        }
    }

    /// The property map of an object-shaped fragment, wrapped or flat.
    pub fn props(&self) -> Option<&Props> {
        match self {
            Fragment::Node(Node { kind: NodeKind::Object(Some(props)), .. }) => Some(props),
            Fragment::Props { props, .. } => Some(props),
            _ => None,
        }
    }

    /// Type-level extras of an object-shaped fragment.
    pub fn object_extras(&self) -> Option<&Extras> {
        match self {
            Fragment::Node(Node { kind: NodeKind::Object(Some(_)), extras, .. }) => Some(extras),
            Fragment::Props { extras, .. } => Some(extras),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Fragment::Empty => Value::Object(Map::new()),
            Fragment::Node(node) => node.to_value(),
            Fragment::Props { props, extras } => {
                let mut map = props_to_map(props);
                for (k, v) in extras {
                    map.insert(k.clone(), v.clone());
                }
                Value::Object(map)
            }
            Fragment::Alternatives(entries) => Value::Array(
                entries
                    .iter()
                    .map(|entry| match entry {
                        Fragment::Bare(name) => json!({ "type": name }),
                        entry => entry.to_value(),
                    })
                    .collect(),
            ),
            Fragment::Bare(name) => Value::from(name.clone()),
        }
    }
}

impl NodeKind {
    /// Value of the rendered `type` key.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::Primitive(name) => name,
            NodeKind::Forbidden => "forbidden",
            NodeKind::Enum(_) => "enum",
            NodeKind::Array(_) => "array",
            NodeKind::Object(_) => "object",
        }
    }
}

impl Node {
    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(self.kind.type_name()));
        match &self.kind {
            NodeKind::Primitive(_) | NodeKind::Forbidden => {}
            NodeKind::Enum(values) => {
                map.insert("values".into(), Value::Array(values.iter().map(LiteralValue::to_json).collect()));
            }
            NodeKind::Array(items) => {
                if let Some(items) = items {
                    map.insert("items".into(), items.to_value());
                }
            }
            NodeKind::Object(props) => {
                if let Some(props) = props {
                    map.insert("props".into(), Value::Object(props_to_map(props)));
                }
            }
        }
        if self.optional {
            map.insert("optional".into(), Value::Bool(true));
        }
        for (k, v) in &self.extras {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

impl From<&Fragment> for Value {
    fn from(fragment: &Fragment) -> Self {
        fragment.to_value()
    }
}

fn props_to_map(props: &Props) -> Map<String, Value> {
    props.iter().map(|(k, f)| (k.clone(), f.to_value())).collect()
}

fn bare_props(props: Props) -> Props {
    props.into_iter().map(|(k, f)| (k, f.into_bare())).collect()
}

fn extend(into: &mut Extras, from: &Extras) {
    for (k, v) in from {
        into.insert(k.clone(), v.clone());
    }
}

// Helper: prefer emitting integers when exact
pub(crate) fn json_num_pref_i64(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
