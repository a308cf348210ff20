//! Adapter between the checker's flag soup and the walker.
//!
//! The walker only ever matches on [`TypeShape`]; every decision about which
//! flag wins when several are set is made once, here.

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::descriptor::{Descriptor, DescriptorTable, DocTag, IndexKind, Member, TypeFlag, TypeId};
use crate::error::Result;

/// The query surface the walker needs from a type checker.
pub trait TypeOracle {
    fn shape(&self, id: TypeId) -> Result<TypeShape<'_>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Any,
}

impl Primitive {
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Any => "any",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    String(String),
    Number(OrderedFloat<f64>),
    Boolean(bool),
}

impl LiteralValue {
    pub fn to_json(&self) -> Value {
        match self {
            LiteralValue::String(s) => Value::from(s.clone()),
            LiteralValue::Number(n) => crate::fragment::json_num_pref_i64(n.0),
            LiteralValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenKind {
    Null,
    Undefined,
    Never,
}

/// An object type: interface, type literal, class instance, array or
/// dictionary. Which of those it is gets decided by the walker, because the
/// predefined alias table has to be consulted first.
#[derive(Debug, Clone, Copy)]
pub struct ObjectShape<'a> {
    pub symbol: Option<&'a str>,
    pub alias_symbol: Option<&'a str>,
    /// `Some` for array references; the slice may be empty (untyped array).
    pub array: Option<&'a [TypeId]>,
    pub index: Option<IndexKind>,
    pub members: &'a [Member],
    pub tags: &'a [DocTag],
}

#[derive(Debug, Clone)]
pub enum TypeShape<'a> {
    Primitive(Primitive),
    Literal(LiteralValue),
    /// Boolean literals are kept apart from other literals: unions treat
    /// them specially.
    BooleanLiteral(bool),
    Forbidden(ForbiddenKind),
    Object(ObjectShape<'a>),
    Union(&'a [TypeId]),
    Intersection { types: &'a [TypeId], tags: &'a [DocTag] },
    Enum(&'a [TypeId]),
    Unsupported(&'a [TypeFlag]),
}

impl TypeShape<'_> {
    pub fn is_literal(&self) -> bool {
        matches!(self, TypeShape::Literal(_) | TypeShape::BooleanLiteral(_))
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TypeShape::Primitive(_) => "primitive",
            TypeShape::Literal(_) | TypeShape::BooleanLiteral(_) => "literal",
            TypeShape::Forbidden(_) => "forbidden",
            TypeShape::Object(_) => "object",
            TypeShape::Union(_) => "union",
            TypeShape::Intersection { .. } => "intersection",
            TypeShape::Enum(_) => "enum",
            TypeShape::Unsupported(_) => "unsupported",
        }
    }
}

impl TypeOracle for DescriptorTable {
    fn shape(&self, id: TypeId) -> Result<TypeShape<'_>> {
        Ok(classify(self.get(id)?))
    }
}

/// Map flags to a shape. First match wins:
/// primitives (and their literals), null/undefined/never, objects, unions,
/// intersections, enums.
pub fn classify(d: &Descriptor) -> TypeShape<'_> {
    use TypeFlag as F;

    if d.has_any(&[F::String, F::Number, F::Boolean, F::Any]) {
        if d.has(&F::Literal) {
            if let Some(shape) = literal(d) {
                return shape;
            }
            return TypeShape::Unsupported(&d.flags);
        }
        let primitive = if d.has(&F::String) {
            Primitive::String
        } else if d.has(&F::Number) {
            Primitive::Number
        } else if d.has(&F::Boolean) {
            Primitive::Boolean
        } else {
            Primitive::Any
        };
        return TypeShape::Primitive(primitive);
    }

    if d.has(&F::Null) {
        return TypeShape::Forbidden(ForbiddenKind::Null);
    }
    if d.has(&F::Undefined) {
        return TypeShape::Forbidden(ForbiddenKind::Undefined);
    }
    if d.has(&F::Never) {
        return TypeShape::Forbidden(ForbiddenKind::Never);
    }

    if d.has(&F::Object) {
        return TypeShape::Object(ObjectShape {
            symbol: d.symbol.as_deref(),
            alias_symbol: d.alias_symbol.as_deref(),
            array: d.has(&F::Array).then_some(d.type_arguments.as_slice()),
            index: d.index,
            members: &d.members,
            tags: &d.tags,
        });
    }

    if d.has(&F::Union) {
        return TypeShape::Union(&d.types);
    }
    if d.has(&F::Intersection) {
        return TypeShape::Intersection { types: &d.types, tags: &d.tags };
    }
    if d.has(&F::EnumLike) {
        return TypeShape::Enum(&d.types);
    }

    TypeShape::Unsupported(&d.flags)
}

fn literal(d: &Descriptor) -> Option<TypeShape<'_>> {
    match &d.value {
        Some(Value::String(s)) => Some(TypeShape::Literal(LiteralValue::String(s.clone()))),
        Some(Value::Number(n)) => n.as_f64().map(|f| TypeShape::Literal(LiteralValue::Number(OrderedFloat(f)))),
        Some(Value::Bool(b)) => Some(TypeShape::BooleanLiteral(*b)),
        Some(_) => None,
        None => match d.intrinsic_name.as_deref() {
            Some("true") => Some(TypeShape::BooleanLiteral(true)),
            Some("false") => Some(TypeShape::BooleanLiteral(false)),
            _ => None,
        },
    }
}
