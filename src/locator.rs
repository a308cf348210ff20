//! Finds calls of the designated function and splices the walker's output in
//! their place.

use serde_json::{Map, Value};
use tracing::{info, trace};

use crate::config::Config;
use crate::error::Result;
use crate::oracle::TypeOracle;
use crate::syntax::{CallExpr, Node, Unit};
use crate::walker::Walker;

pub struct Locator<'c> {
    config: &'c Config,
}

impl<'c> Locator<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// Whether the call resolved to the designated declaration.
    pub fn is_designated(&self, call: &CallExpr) -> bool {
        let Some(sig) = &call.signature else {
            return false;
        };
        if sig.name != self.config.function_name {
            return false;
        }
        match (&self.config.module, &sig.file) {
            (None, _) => true,
            (Some(module), Some(file)) => file.ends_with(module.as_str()),
            (Some(_), None) => false,
        }
    }

    /// The literal replacing `call`, or `None` when the call is not ours.
    pub fn expand<O: TypeOracle + ?Sized>(&self, call: &CallExpr, oracle: &O) -> Result<Option<Value>> {
        if !self.is_designated(call) {
            return Ok(None);
        }
        let Some(&ty) = call.type_arguments.first() else {
            return Ok(Some(Value::Object(Map::new())));
        };
        // Only a literal `false` switches annotations off.
        let additional = !matches!(
            call.arguments.first().and_then(|a| a.constant.as_ref()),
            Some(Value::Bool(false))
        );
        let fragment = Walker::new(oracle, self.config).schema(ty, additional)?;
        Ok(Some(fragment.to_value()))
    }

    /// Rewrite `node` and everything below it. Returns the number of calls
    /// replaced.
    pub fn rewrite<O: TypeOracle + ?Sized>(&self, node: &mut Node, oracle: &O) -> Result<usize> {
        let mut count = 0;
        let replacement = match node {
            Node::Call(call) => {
                trace!(callee = %call.callee, "call expression");
                match self.expand(call, oracle)? {
                    Some(value) => {
                        info!(callee = %call.callee, "rewrote call site");
                        Some(value)
                    }
                    None => None,
                }
            }
            _ => None,
        };
        if let Some(value) = replacement {
            *node = Node::Literal { value };
            count += 1;
        }
        for child in node.children_mut() {
            count += self.rewrite(child, oracle)?;
        }
        Ok(count)
    }

    pub fn rewrite_unit(&self, unit: &mut Unit) -> Result<usize> {
        let Unit { types, body, .. } = unit;
        let mut count = 0;
        for node in body.iter_mut() {
            count += self.rewrite(node, &*types)?;
        }
        Ok(count)
    }
}
