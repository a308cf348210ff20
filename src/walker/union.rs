//! Union merge.
//!
//! `undefined` constituents are not branches: they make the slot optional.
//! `true`/`false` literals collapse to a single representative (the checker
//! expands `boolean` to `true | false` inside larger unions). What remains
//! becomes the single surviving branch, one enum, or a list of alternatives.

use tracing::trace;

use super::{Frame, Walker};
use crate::descriptor::TypeId;
use crate::error::Result;
use crate::fragment::Fragment;
use crate::oracle::{ForbiddenKind, LiteralValue, TypeOracle, TypeShape};

impl<'o, O: TypeOracle + ?Sized> Walker<'o, O> {
    pub(super) fn union(&self, types: &[TypeId], frame: Frame<'_>, optional: bool) -> Result<Fragment> {
        let mut union_optional = false;
        let mut saw_boolean = false;
        let mut branches: Vec<(TypeId, TypeShape<'o>)> = Vec::with_capacity(types.len());

        for &id in types {
            match self.oracle.shape(id)? {
                TypeShape::Forbidden(ForbiddenKind::Undefined) => union_optional = true,
                // First boolean literal is kept, the rest dropped.
                TypeShape::BooleanLiteral(_) if saw_boolean => {}
                shape @ TypeShape::BooleanLiteral(_) => {
                    saw_boolean = true;
                    branches.push((id, shape));
                }
                shape => branches.push((id, shape)),
            }
        }

        let optional = optional || union_optional;
        trace!(branches = branches.len(), optional, "union");

        if branches.is_empty() {
            // Only `undefined` was listed.
            return Ok(Fragment::forbidden());
        }

        if branches.len() == 1 {
            let (id, shape) = branches.remove(0);
            return match shape {
                TypeShape::BooleanLiteral(_) => Ok(Fragment::primitive("boolean").optional(optional)),
                shape => self.dispatch(id, shape, frame, optional),
            };
        }

        if branches.iter().all(|(_, shape)| shape.is_literal()) {
            let values = branches
                .into_iter()
                .filter_map(|(_, shape)| match shape {
                    TypeShape::Literal(value) => Some(value),
                    TypeShape::BooleanLiteral(b) => Some(LiteralValue::Boolean(b)),
                    _ => None,
                })
                .collect();
            return Ok(Fragment::enumeration(values).optional(optional));
        }

        let mut alternatives = Vec::with_capacity(branches.len());
        for (id, shape) in branches {
            let fragment = match shape {
                TypeShape::BooleanLiteral(_) => Fragment::primitive("boolean"),
                shape => self.dispatch(id, shape, frame.deeper(), false)?,
            };
            alternatives.push(fragment);
        }
        Ok(Fragment::Alternatives(alternatives).optional(optional))
    }
}
