//! Object shapes: predefined aliases, arrays, dictionaries, interfaces and
//! intersections.

use tracing::{debug, warn};

use super::{Frame, Link, Walker};
use crate::annotation::parse_tags;
use crate::descriptor::{DocTag, MemberOrigin, TypeId};
use crate::error::Result;
use crate::fragment::{Extras, Fragment, Props};
use crate::oracle::{ObjectShape, TypeOracle};

impl<'o, O: TypeOracle + ?Sized> Walker<'o, O> {
    pub(super) fn object_type(
        &self,
        id: TypeId,
        obj: ObjectShape<'o>,
        frame: Frame<'_>,
        optional: bool,
    ) -> Result<Fragment> {
        if let Some(alias) = self.predefined(&obj) {
            debug!(%id, alias, "predefined type");
            return Ok(Fragment::primitive(alias).optional(optional));
        }

        if let Some(args) = obj.array {
            return self.array(args, frame, optional);
        }

        if let Some(kind) = obj.index {
            // Keys of an open dictionary cannot be enumerated at compile time.
            debug!(%id, ?kind, "index signature, emitting opaque object");
            return Ok(Fragment::opaque_object().optional(optional));
        }

        let name = self.identity(&obj);
        if let Some(name) = name {
            if frame.is_ancestor(name) {
                debug!(%id, name, depth = frame.depth, "cycle closed with any");
                return Ok(Fragment::primitive("any").optional(optional));
            }
        }

        let link;
        let inner = match name {
            Some(name) => {
                link = Link { name, parent: frame.ancestors };
                frame.enter(&link)
            }
            None => frame,
        };
        self.members(obj, inner, optional)
    }

    /// Walk declared (and synthesized) members in order. A later member with
    /// the same name replaces the earlier one in place.
    fn members(&self, obj: ObjectShape<'o>, frame: Frame<'_>, optional: bool) -> Result<Fragment> {
        let annotate = self.annotations_enabled(frame);
        let mut props = Props::new();

        for member in obj.members.iter().filter(|m| m.origin != MemberOrigin::Undeclared) {
            let mut fragment = self.walk(member.ty, frame.deeper(), member.optional)?;
            if annotate && !member.tags.is_empty() {
                if fragment.is_mapping() {
                    fragment = fragment.with_extras(&parse_tags(&member.tags));
                } else {
                    debug!(member = %member.name, "no `type` level to annotate, tags skipped");
                }
            }
            props.insert(member.name.clone(), fragment);
        }

        if props.is_empty() {
            return Ok(Fragment::Empty);
        }

        let extras = if annotate { parse_tags(obj.tags) } else { Extras::new() };
        Ok(self.assemble(props, extras, frame, optional))
    }

    /// Walk every constituent, then merge their properties. On a name clash
    /// the constituent listed first wins.
    pub(super) fn intersection(
        &self,
        types: &'o [TypeId],
        tags: &'o [DocTag],
        frame: Frame<'_>,
        optional: bool,
    ) -> Result<Fragment> {
        let mut props = Props::new();
        let mut extras = Extras::new();

        for &part_id in types {
            let part = self.walk(part_id, frame.deeper(), false)?;
            match part.props() {
                Some(part_props) => {
                    for (name, fragment) in part_props {
                        props.entry(name.clone()).or_insert_with(|| fragment.clone());
                    }
                }
                None if part == Fragment::Empty => {}
                None => {
                    warn!(%part_id, "intersection constituent is not an object, ignored");
                }
            }
            if let Some(part_extras) = part.object_extras() {
                for (k, v) in part_extras {
                    extras.insert(k.clone(), v.clone());
                }
            }
        }

        if self.annotations_enabled(frame) {
            for (k, v) in parse_tags(tags) {
                extras.insert(k, v);
            }
        }

        if props.is_empty() {
            return Ok(Fragment::Empty);
        }
        Ok(self.assemble(props, extras, frame, optional))
    }

    fn assemble(&self, props: Props, extras: Extras, frame: Frame<'_>, optional: bool) -> Fragment {
        if self.emits_flat(frame) {
            Fragment::Props { props, extras }
        } else {
            Fragment::object(props).optional(optional).with_extras(&extras)
        }
    }

    fn predefined(&self, obj: &ObjectShape<'o>) -> Option<&'o str> {
        [obj.symbol, obj.alias_symbol]
            .into_iter()
            .flatten()
            .find_map(|s| self.config.predefined.get(s).map(String::as_str))
    }

    /// Name used for cycle detection: the symbol, or the alias of an
    /// anonymous type literal. `None` never enters the ancestor chain.
    fn identity(&self, obj: &ObjectShape<'o>) -> Option<&'o str> {
        [obj.symbol, obj.alias_symbol]
            .into_iter()
            .flatten()
            .find(|s| !self.config.is_anonymous(s))
    }
}
