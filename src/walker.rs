//! Type-graph walker: resolved type → schema fragment.
//!
//! Depth-first over a possibly cyclic graph. The only state carried down is
//! a [`Frame`]: the chain of named object types on the active path, the
//! nesting depth and the call-site annotation switch. Frames are values;
//! entering a named type links a new frame on the stack, returning drops it,
//! so siblings never see each other as ancestors.
//!
//! Design goals:
//! - One dispatch over the closed [`TypeShape`] enum; new shapes are a
//!   compile error here.
//! - Same traversal for every output [`Mode`](crate::config::Mode).
//! - Fragments are built bottom-up and never edited after the fact.
pub mod object;
pub mod union;

use tracing::{debug, trace};

use crate::config::{ArrayItems, Config, LeafStyle, ObjectStyle};
use crate::descriptor::TypeId;
use crate::error::{Error, Result};
use crate::fragment::Fragment;
use crate::oracle::{LiteralValue, TypeOracle, TypeShape};

// ------------------------------- Frames ---------------------------------- //

struct Link<'a> {
    name: &'a str,
    parent: Option<&'a Link<'a>>,
}

#[derive(Clone, Copy)]
pub(crate) struct Frame<'a> {
    ancestors: Option<&'a Link<'a>>,
    depth: usize,
    additional: bool,
}

impl<'a> Frame<'a> {
    fn root(additional: bool) -> Self {
        Self { ancestors: None, depth: 0, additional }
    }

    fn deeper(self) -> Self {
        Self { depth: self.depth + 1, ..self }
    }

    fn is_ancestor(&self, name: &str) -> bool {
        let mut cur = self.ancestors;
        while let Some(link) = cur {
            if link.name == name {
                return true;
            }
            cur = link.parent;
        }
        false
    }

    fn enter<'b>(self, link: &'b Link<'b>) -> Frame<'b>
    where
        'a: 'b,
    {
        Frame { ancestors: Some(link), depth: self.depth, additional: self.additional }
    }
}

// ------------------------------- Walker ---------------------------------- //

pub struct Walker<'o, O: TypeOracle + ?Sized> {
    oracle: &'o O,
    config: &'o Config,
}

impl<'o, O: TypeOracle + ?Sized> Walker<'o, O> {
    pub fn new(oracle: &'o O, config: &'o Config) -> Self {
        Self { oracle, config }
    }

    /// Fragment for one call site. `additional` is the call's runtime flag;
    /// `false` turns annotation merging off for the whole traversal.
    pub fn schema(&self, id: TypeId, additional: bool) -> Result<Fragment> {
        let fragment = self.walk(id, Frame::root(additional), false)?;
        Ok(match self.config.mode.leaves {
            LeafStyle::Typed => fragment,
            LeafStyle::Bare => fragment.into_bare(),
        })
    }

    pub(crate) fn walk(&self, id: TypeId, frame: Frame<'_>, optional: bool) -> Result<Fragment> {
        let shape = self.oracle.shape(id)?;
        self.dispatch(id, shape, frame, optional)
    }

    pub(crate) fn dispatch(
        &self,
        id: TypeId,
        shape: TypeShape<'o>,
        frame: Frame<'_>,
        optional: bool,
    ) -> Result<Fragment> {
        if frame.depth > self.config.max_depth {
            return Err(Error::DepthLimit { id, limit: self.config.max_depth });
        }
        trace!(%id, kind = shape.kind(), depth = frame.depth, optional, "walk");

        match shape {
            TypeShape::Primitive(p) => Ok(Fragment::primitive(p.as_str()).optional(optional)),
            TypeShape::Literal(value) => Ok(Fragment::enumeration(vec![value]).optional(optional)),
            // `true` and `false` on their own are one-value enums, not booleans.
            TypeShape::BooleanLiteral(b) => {
                Ok(Fragment::enumeration(vec![LiteralValue::Boolean(b)]).optional(optional))
            }
            TypeShape::Forbidden(_) => Ok(Fragment::forbidden()),
            TypeShape::Object(obj) => self.object_type(id, obj, frame, optional),
            TypeShape::Union(types) => self.union(types, frame, optional),
            TypeShape::Intersection { types, tags } => self.intersection(types, tags, frame, optional),
            TypeShape::Enum(types) => self.enumeration(id, types, optional),
            TypeShape::Unsupported(flags) => Err(Error::Unrecognized { id, flags: flags.to_vec() }),
        }
    }

    fn array(&self, args: &[TypeId], frame: Frame<'_>, optional: bool) -> Result<Fragment> {
        if self.config.mode.array_items == ArrayItems::Opaque {
            return Ok(Fragment::array(None).optional(optional));
        }
        let items = match args {
            [] => None,
            [single] => Some(self.walk(*single, frame.deeper(), false)?),
            many => Some(self.union(many, frame.deeper(), false)?),
        };
        Ok(Fragment::array(items).optional(optional))
    }

    fn enumeration(&self, id: TypeId, members: &[TypeId], optional: bool) -> Result<Fragment> {
        let mut values = Vec::with_capacity(members.len());
        for &member in members {
            match self.oracle.shape(member)? {
                TypeShape::Literal(value) => values.push(value),
                TypeShape::BooleanLiteral(b) => values.push(LiteralValue::Boolean(b)),
                other => {
                    debug!(%id, %member, kind = other.kind(), "enum member is not a literal");
                    return Err(Error::Unrecognized { id: member, flags: Vec::new() });
                }
            }
        }
        Ok(Fragment::enumeration(values).optional(optional))
    }

    fn annotations_enabled(&self, frame: Frame<'_>) -> bool {
        self.config.mode.annotations && frame.additional
    }

    /// Object results at the top level, and everywhere in flat mode, are
    /// bare property maps.
    fn emits_flat(&self, frame: Frame<'_>) -> bool {
        frame.depth == 0 || self.config.mode.objects == ObjectStyle::Flat
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::descriptor::DescriptorTable;
    use serde_json::{json, Value};

    pub(crate) fn table(types: Value) -> DescriptorTable {
        serde_json::from_value(json!({ "types": types })).unwrap()
    }

    pub(crate) fn run_with(types: Value, root: u32, mode: Mode, additional: bool) -> Result<Value> {
        let table = table(types);
        let config = Config { mode, ..Config::default() };
        let walker = Walker::new(&table, &config);
        walker.schema(TypeId(root), additional).map(|f| f.to_value())
    }

    pub(crate) fn run(types: Value, root: u32) -> Value {
        run_with(types, root, Mode::default(), true).unwrap()
    }

    fn flat() -> Mode {
        Mode { objects: ObjectStyle::Flat, ..Mode::default() }
    }

    #[test]
    fn empty_interface_is_empty() {
        let types = json!([{"flags": ["object"], "symbol": "IEmpty"}]);
        for mode in Mode::all() {
            assert_eq!(run_with(types.clone(), 0, mode, true).unwrap(), json!({}));
        }
    }

    #[test]
    fn primitives_at_top_level() {
        assert_eq!(run(json!([{"flags": ["string"]}]), 0), json!({"type": "string"}));
        assert_eq!(run(json!([{"flags": ["any"]}]), 0), json!({"type": "any"}));
        assert_eq!(run(json!([{"flags": ["boolean", "union"], "types": []}]), 0), json!({"type": "boolean"}));
    }

    #[test]
    fn interface_with_string_in_every_object_style() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IString", "members": [{"name": "str", "type": 0}]},
            {"flags": ["object"], "symbol": "IOuter", "members": [{"name": "inner", "type": 1}]}
        ]);
        assert_eq!(run(types.clone(), 1), json!({"str": {"type": "string"}}));
        assert_eq!(
            run(types.clone(), 2),
            json!({"inner": {"type": "object", "props": {"str": {"type": "string"}}}})
        );
        assert_eq!(
            run_with(types, 2, flat(), true).unwrap(),
            json!({"inner": {"str": {"type": "string"}}})
        );
    }

    #[test]
    fn flat_member_annotations_never_touch_property_names() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IInner", "members": [{"name": "min", "type": 0}]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "inner", "type": 1, "tags": ["@min 3"]}
            ]}
        ]);
        assert_eq!(
            run_with(types.clone(), 2, flat(), true).unwrap(),
            json!({"inner": {"min": {"type": "string"}}})
        );
        assert_eq!(
            run(types, 2),
            json!({"inner": {"type": "object", "props": {"min": {"type": "string"}}, "min": 3}})
        );
    }

    #[test]
    fn flat_nested_object_has_no_optional_marker() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IInner", "members": [{"name": "min", "type": 0}]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "o", "type": 1, "optional": true}
            ]}
        ]);
        assert_eq!(
            run_with(types.clone(), 2, flat(), true).unwrap(),
            json!({"o": {"min": {"type": "string"}}})
        );
        assert_eq!(
            run(types, 2),
            json!({"o": {"type": "object", "optional": true, "props": {"min": {"type": "string"}}}})
        );
    }

    #[test]
    fn bare_leaves_name_the_type() {
        let bare = Mode { leaves: LeafStyle::Bare, ..Mode::default() };
        // keys<IString>()
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IString", "members": [{"name": "name", "type": 0}]}
        ]);
        assert_eq!(run_with(types, 1, bare, true).unwrap(), json!({"name": "string"}));

        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [0]},
            {"flags": ["union"], "types": [0, 1]},
            {"flags": ["object"], "symbol": "IEmail"},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "list", "type": 2, "optional": true},
                {"name": "either", "type": 3},
                {"name": "email", "type": 4},
                {"name": "count", "type": 1, "tags": ["@min 1"]}
            ]}
        ]);
        assert_eq!(
            run_with(types, 5, bare, true).unwrap(),
            json!({
                "list": "array",
                "either": [{"type": "string"}, {"type": "number"}],
                "email": "email",
                "count": "number"
            })
        );
    }

    #[test]
    fn optional_member() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IString", "members": [{"name": "opt", "type": 0, "optional": true}]}
        ]);
        assert_eq!(run(types, 1), json!({"opt": {"type": "string", "optional": true}}));
    }

    #[test]
    fn predefined_alias_ignores_members() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IEmail", "members": [{"name": "x", "type": 0}]},
            {"flags": ["object"], "symbol": "IPredefined", "members": [
                {"name": "email", "type": 1},
                {"name": "maybe", "type": 1, "optional": true}
            ]}
        ]);
        assert_eq!(
            run(types, 2),
            json!({"email": {"type": "email"}, "maybe": {"type": "email", "optional": true}})
        );
    }

    #[test]
    fn predefined_alias_by_alias_symbol() {
        let types = json!([
            {"flags": ["object"], "symbol": "__type", "alias_symbol": "IUUID"},
            {"flags": ["object"], "symbol": "I", "members": [{"name": "id", "type": 0}]}
        ]);
        assert_eq!(run(types, 1), json!({"id": {"type": "uuid"}}));
    }

    #[test]
    fn null_and_never_are_forbidden_even_when_optional() {
        let types = json!([
            {"flags": ["null"]},
            {"flags": ["never"]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "n", "type": 0, "optional": true},
                {"name": "v", "type": 1}
            ]}
        ]);
        assert_eq!(run(types, 2), json!({"n": {"type": "forbidden"}, "v": {"type": "forbidden"}}));
    }

    #[test]
    fn single_literals_are_one_value_enums() {
        let types = json!([
            {"flags": ["string", "literal"], "value": "x"},
            {"flags": ["boolean", "literal"], "intrinsic_name": "true"},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "s", "type": 0},
                {"name": "t", "type": 1, "optional": true}
            ]}
        ]);
        assert_eq!(
            run(types, 2),
            json!({
                "s": {"type": "enum", "values": ["x"]},
                "t": {"type": "enum", "values": [true], "optional": true}
            })
        );
    }

    #[test]
    fn enum_member_type() {
        // enum Role { Admin = 1, Manager = 2, Employee = "string" }
        let types = json!([
            {"flags": ["number", "literal", "enum_like"], "value": 1, "symbol": "Admin"},
            {"flags": ["number", "literal", "enum_like"], "value": 2, "symbol": "Manager"},
            {"flags": ["string", "literal", "enum_like"], "value": "string", "symbol": "Employee"},
            {"flags": ["union", "enum_like"], "symbol": "Role", "types": [0, 1, 2]},
            {"flags": ["enum_like"], "symbol": "Role", "types": [0, 1, 2]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "role", "type": 3},
                {"name": "plain", "type": 4, "optional": true}
            ]}
        ]);
        assert_eq!(
            run(types, 5),
            json!({
                "role": {"type": "enum", "values": [1, 2, "string"]},
                "plain": {"type": "enum", "values": [1, 2, "string"], "optional": true}
            })
        );
    }

    #[test]
    fn enum_with_non_literal_member_is_fatal() {
        let types = json!([{"flags": ["string"]}, {"flags": ["enum_like"], "types": [0]}]);
        assert!(matches!(
            run_with(types, 1, Mode::default(), true),
            Err(Error::Unrecognized { id: TypeId(0), .. })
        ));
    }

    #[test]
    fn unrecognized_type_is_fatal() {
        let types = json!([
            {"flags": ["type_parameter"]},
            {"flags": ["object"], "symbol": "I", "members": [{"name": "t", "type": 0}]}
        ]);
        let err = run_with(types, 1, Mode::default(), true).unwrap_err();
        assert!(matches!(err, Error::Unrecognized { id: TypeId(0), .. }), "{err}");
    }

    #[test]
    fn dangling_reference_is_an_error() {
        let types = json!([{"flags": ["object"], "symbol": "I", "members": [{"name": "t", "type": 9}]}]);
        assert!(matches!(run_with(types, 0, Mode::default(), true), Err(Error::UnknownType(TypeId(9)))));
    }

    #[test]
    fn arrays() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [0]},
            {"flags": ["object", "array"], "symbol": "Array"},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [0, 1]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "typed", "type": 2},
                {"name": "raw", "type": 3, "optional": true},
                {"name": "mixed", "type": 4}
            ]}
        ]);
        assert_eq!(
            run(types.clone(), 5),
            json!({
                "typed": {"type": "array", "items": {"type": "string"}},
                "raw": {"type": "array", "optional": true},
                "mixed": {"type": "array", "items": [{"type": "string"}, {"type": "number"}]}
            })
        );
        let opaque = Mode { array_items: ArrayItems::Opaque, ..Mode::default() };
        assert_eq!(
            run_with(types, 5, opaque, true).unwrap(),
            json!({
                "typed": {"type": "array"},
                "raw": {"type": "array", "optional": true},
                "mixed": {"type": "array"}
            })
        );
    }

    #[test]
    fn array_of_interfaces() {
        let types = json!([
            {"flags": ["number"]},
            {"flags": ["object"], "symbol": "IPoint", "members": [{"name": "x", "type": 0}]},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [1]},
            {"flags": ["object"], "symbol": "IPath", "members": [{"name": "points", "type": 2}]}
        ]);
        assert_eq!(
            run(types, 3),
            json!({"points": {"type": "array", "items": {"type": "object", "props": {"x": {"type": "number"}}}}})
        );
    }

    #[test]
    fn index_signature_is_opaque() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [0]},
            {"flags": ["object"], "symbol": "__type", "index": "string", "members": [{"name": "x", "type": 0}]},
            {"flags": ["object"], "symbol": "IIndex", "members": [{"name": "index", "type": 2}]}
        ]);
        assert_eq!(run(types, 3), json!({"index": {"type": "object"}}));
    }

    #[test]
    fn mapped_type_members_are_walked_and_undeclared_skipped() {
        // type Query = { [type in Enumerable]?: string | string[] }
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object", "array"], "symbol": "Array", "type_arguments": [0]},
            {"flags": ["undefined"]},
            {"flags": ["union"], "types": [2, 0, 1]},
            {"flags": ["object"], "symbol": "__type", "alias_symbol": "Query", "members": [
                {"name": "a", "type": 3, "optional": true, "origin": "synthetic"},
                {"name": "b", "type": 3, "optional": true, "origin": "synthetic"},
                {"name": "ghost", "type": 0, "origin": "undeclared"}
            ]}
        ]);
        let branch = json!([
            {"type": "string", "optional": true},
            {"type": "array", "items": {"type": "string"}, "optional": true}
        ]);
        assert_eq!(run(types, 4), json!({"a": branch.clone(), "b": branch}));
    }

    #[test]
    fn two_interface_cycle_closes_with_any() {
        let types = json!([
            {"flags": ["object"], "symbol": "IA", "members": [{"name": "b", "type": 1}]},
            {"flags": ["object"], "symbol": "IB", "members": [{"name": "a", "type": 0}]}
        ]);
        assert_eq!(
            run(types, 0),
            json!({"b": {"type": "object", "props": {"a": {"type": "any"}}}})
        );
    }

    #[test]
    fn three_interface_cycle_closes_with_any() {
        let types = json!([
            {"flags": ["object"], "symbol": "IA", "members": [{"name": "b", "type": 1}]},
            {"flags": ["object"], "symbol": "IB", "members": [{"name": "c", "type": 2, "optional": true}]},
            {"flags": ["object"], "symbol": "IC", "members": [{"name": "a", "type": 0}]}
        ]);
        assert_eq!(
            run(types, 0),
            json!({"b": {"type": "object", "props": {
                "c": {"type": "object", "optional": true, "props": {"a": {"type": "any"}}}
            }}})
        );
    }

    #[test]
    fn self_reference_through_alias_name() {
        // type Node = { value: number; next?: Node }
        let types = json!([
            {"flags": ["number"]},
            {"flags": ["object"], "symbol": "__type", "alias_symbol": "Node", "members": [
                {"name": "value", "type": 0},
                {"name": "next", "type": 1, "optional": true}
            ]}
        ]);
        assert_eq!(
            run(types, 1),
            json!({"value": {"type": "number"}, "next": {"type": "any", "optional": true}})
        );
    }

    #[test]
    fn siblings_are_not_ancestors() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IB", "members": [{"name": "v", "type": 0}]},
            {"flags": ["object"], "symbol": "IA", "members": [
                {"name": "x", "type": 1},
                {"name": "y", "type": 1}
            ]}
        ]);
        let b = json!({"type": "object", "props": {"v": {"type": "string"}}});
        assert_eq!(run(types, 2), json!({"x": b.clone(), "y": b}));
    }

    #[test]
    fn anonymous_cycle_hits_depth_limit() {
        let types = json!([{"flags": ["object"], "symbol": "__type", "members": [{"name": "me", "type": 0}]}]);
        assert!(matches!(
            run_with(types, 0, Mode::default(), true),
            Err(Error::DepthLimit { id: TypeId(0), .. })
        ));
    }

    #[test]
    fn member_override_keeps_position_last_write_wins() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "a", "type": 0},
                {"name": "b", "type": 0},
                {"name": "a", "type": 1}
            ]}
        ]);
        let out = run(types, 2);
        assert_eq!(out, json!({"a": {"type": "number"}, "b": {"type": "string"}}));
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn member_annotations() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "name", "type": 0, "tags": ["@min 3", "@max 64", "@trim true"]}
            ]}
        ]);
        let annotated = json!({"name": {"type": "string", "min": 3, "max": 64, "trim": true}});
        let plain = json!({"name": {"type": "string"}});
        assert_eq!(run(types.clone(), 1), annotated);
        // call-site `schema<I>(false)`
        assert_eq!(run_with(types.clone(), 1, Mode::default(), false).unwrap(), plain);
        let off = Mode { annotations: false, ..Mode::default() };
        assert_eq!(run_with(types, 1, off, true).unwrap(), plain);
    }

    #[test]
    fn annotations_skip_lists() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["union"], "types": [0, 1]},
            {"flags": ["object"], "symbol": "I", "members": [{"name": "u", "type": 2, "tags": ["@min 1"]}]}
        ]);
        assert_eq!(run(types, 3), json!({"u": [{"type": "string"}, {"type": "number"}]}));
    }

    #[test]
    fn strict_tag_is_a_sibling_of_props() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IInner", "tags": ["@$$strict true"], "members": [{"name": "s", "type": 0}]},
            {"flags": ["object"], "symbol": "IOuter", "tags": ["@$$strict remove"], "members": [{"name": "inner", "type": 1}]}
        ]);
        assert_eq!(
            run(types.clone(), 2),
            json!({
                "inner": {"type": "object", "props": {"s": {"type": "string"}}, "$$strict": true},
                "$$strict": "remove"
            })
        );
        assert_eq!(
            run_with(types, 2, Mode::default(), false).unwrap(),
            json!({"inner": {"type": "object", "props": {"s": {"type": "string"}}}})
        );
    }

    #[test]
    fn generic_instantiations_walk_their_arguments() {
        // interface IGeneric<T> { generic: T } instantiated with string | number
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["union"], "types": [0, 1]},
            {"flags": ["object"], "symbol": "IGeneric", "type_arguments": [2], "members": [{"name": "generic", "type": 2}]}
        ]);
        assert_eq!(run(types, 3), json!({"generic": [{"type": "string"}, {"type": "number"}]}));
    }

    #[test]
    fn walking_is_idempotent() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["object"], "symbol": "IA", "members": [{"name": "b", "type": 2}, {"name": "s", "type": 0}]},
            {"flags": ["object"], "symbol": "IB", "members": [{"name": "a", "type": 1, "tags": ["@x 1"]}]}
        ]);
        for mode in Mode::all() {
            let first = run_with(types.clone(), 1, mode, true).unwrap();
            let second = run_with(types.clone(), 1, mode, true).unwrap();
            assert_eq!(serde_json::to_string(&first).unwrap(), serde_json::to_string(&second).unwrap());
        }
    }

    #[test]
    fn leaf_scenarios_do_not_depend_on_mode() {
        let types = json!([
            {"flags": ["string"]},
            {"flags": ["number"]},
            {"flags": ["union"], "types": [0, 1]},
            {"flags": ["object"], "symbol": "I", "members": [
                {"name": "union", "type": 2},
                {"name": "opt", "type": 0, "optional": true}
            ]}
        ]);
        for mode in Mode::all() {
            assert_eq!(
                run_with(types.clone(), 3, mode, true).unwrap(),
                json!({
                    "union": [{"type": "string"}, {"type": "number"}],
                    "opt": {"type": "string", "optional": true}
                }),
                "{mode:?}"
            );
        }
    }
}
