//! Compiled unit: a syntax tree whose call expressions already carry the
//! checker's answers (resolved signature, type arguments, constant values).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{DescriptorTable, TypeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub types: DescriptorTable,
    #[serde(default)]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Call(CallExpr),
    /// A literal value; also what a rewritten call becomes.
    Literal { value: Value },
    Other {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    /// Source text of the callee, for diagnostics.
    pub callee: String,
    /// Declaration the call resolved to; `None` if resolution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_arguments: Vec<TypeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Constant value the checker folded the argument to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    pub expression: Node,
}

impl Node {
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Call(call) => call.arguments.iter_mut().map(|a| &mut a.expression).collect(),
            Node::Literal { .. } => Vec::new(),
            Node::Other { children, .. } => children.iter_mut().collect(),
        }
    }
}
