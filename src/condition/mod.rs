//! Condition algebra (C1): a recursive tree of leaf operators and boolean
//! combinators, supporting `Eval`, `GetKeys`, `PartialEval`, `Translate`
//! (spec §4.1).

pub mod ops;

use crate::context::ExprContext;
use crate::error::PdpError;
use crate::value_objects::{AttrKey, Value};
use ops::LeafOp;
use serde_json::json;
use std::collections::HashSet;

/// A single leaf condition: `{key, value}` where `value` is always a list
/// (spec §3), a single-valued operator treats a length-1 list as canonical,
/// multiple elements mean "any of".
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub op: LeafOp,
    pub negated: bool,
    pub key: AttrKey,
    pub value: Vec<Value>,
}

impl Leaf {
    pub fn new(op: LeafOp, negated: bool, key: impl Into<String>, value: Vec<Value>) -> Self {
        Self {
            op,
            negated,
            key: key.into(),
            value,
        }
    }

    pub fn any() -> Self {
        Self {
            op: LeafOp::Any,
            negated: false,
            key: String::new(),
            value: Vec::new(),
        }
    }

    fn eval(&self, ctx: &ExprContext) -> bool {
        if self.op == LeafOp::Any {
            return true;
        }

        let attr = ctx.get_attribute(&self.key);
        let positive = match attr {
            None => false,
            Some(v) => v
                .as_elements()
                .into_iter()
                .any(|elem| ops::eval_positive(self.op, elem, &self.value)),
        };

        if self.negated {
            // Closed-world absence: a negated op on a missing key is still
            // false, never true (spec §4.1).
            match attr {
                None => false,
                Some(_) => !positive,
            }
        } else {
            positive
        }
    }

    fn translate(&self) -> Result<serde_json::Value, PdpError> {
        if self.op == LeafOp::Any {
            return Ok(json!({ "op": "any", "field": "", "value": [] }));
        }

        let op_name = self.op.translated_name(self.negated);
        let value = if self.op.unwraps_singleton_value() && self.value.len() == 1 {
            serde_json::to_value(&self.value[0])
        } else {
            serde_json::to_value(&self.value)
        }
        .map_err(|e| PdpError::internal("Condition::translate", e.to_string()))?;

        Ok(json!({ "op": op_name, "field": self.key, "value": value }))
    }
}

/// Recursive condition tree. `And`/`Or` invariant: never constructed with
/// zero children by the parser (spec §3); `Not` wraps a single child and is
/// never folded across a double negation (spec §4.1).
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Leaf),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

/// Result of `PartialEval`: either the condition collapsed to a constant, or
/// a (possibly simplified) residual tree remains (spec §4.1).
#[derive(Debug, Clone, PartialEq)]
pub enum Residual {
    Const(bool),
    Tree(Condition),
}

impl Residual {
    pub fn is_false(&self) -> bool {
        matches!(self, Residual::Const(false))
    }

    /// Evaluate the residual directly: a constant answers itself, a tree is
    /// evaluated against the given (possibly fuller) context.
    pub fn eval(&self, ctx: &ExprContext) -> bool {
        match self {
            Residual::Const(b) => *b,
            Residual::Tree(c) => c.eval(ctx),
        }
    }

    /// Canonicalize into a concrete `Condition` for `Translate` / further
    /// AND-combination: a constant-true residual becomes the trivial `Any`
    /// leaf; a constant-false residual has no sound standalone
    /// representation and should have been dropped by the caller already.
    pub fn into_condition(self) -> Option<Condition> {
        match self {
            Residual::Const(true) => Some(Condition::Leaf(Leaf::any())),
            Residual::Const(false) => None,
            Residual::Tree(c) => Some(c),
        }
    }
}

impl Condition {
    pub fn eval(&self, ctx: &ExprContext) -> bool {
        match self {
            Condition::Leaf(leaf) => leaf.eval(ctx),
            Condition::And(children) => children.iter().all(|c| c.eval(ctx)),
            Condition::Or(children) => children.iter().any(|c| c.eval(ctx)),
            Condition::Not(inner) => !inner.eval(ctx),
        }
    }

    /// Every fully-qualified key referenced by any leaf, deduplicated,
    /// `Any` contributing none (spec §4.1).
    pub fn get_keys(&self) -> Vec<AttrKey> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        self.collect_keys(&mut seen, &mut keys);
        keys
    }

    fn collect_keys(&self, seen: &mut HashSet<AttrKey>, keys: &mut Vec<AttrKey>) {
        match self {
            Condition::Leaf(leaf) => {
                if leaf.op != LeafOp::Any && seen.insert(leaf.key.clone()) {
                    keys.push(leaf.key.clone());
                }
            }
            Condition::And(children) | Condition::Or(children) => {
                for c in children {
                    c.collect_keys(seen, keys);
                }
            }
            Condition::Not(inner) => inner.collect_keys(seen, keys),
        }
    }

    /// Substitute every leaf whose key is present in `ctx` with its boolean
    /// result, then simplify (spec §4.1).
    pub fn partial_eval(&self, ctx: &ExprContext) -> Residual {
        match self {
            Condition::Leaf(leaf) => {
                if leaf.op == LeafOp::Any {
                    return Residual::Const(true);
                }
                match ctx.get_attribute(&leaf.key) {
                    None => Residual::Tree(self.clone()),
                    Some(_) => Residual::Const(leaf.eval(ctx)),
                }
            }
            Condition::And(children) => {
                let mut kept = Vec::new();
                for c in children {
                    match c.partial_eval(ctx) {
                        Residual::Const(false) => return Residual::Const(false),
                        Residual::Const(true) => {}
                        Residual::Tree(t) => kept.push(t),
                    }
                }
                match kept.len() {
                    0 => Residual::Const(true),
                    1 => Residual::Tree(kept.into_iter().next().unwrap()),
                    _ => Residual::Tree(Condition::And(kept)),
                }
            }
            Condition::Or(children) => {
                let mut kept = Vec::new();
                for c in children {
                    match c.partial_eval(ctx) {
                        Residual::Const(true) => return Residual::Const(true),
                        Residual::Const(false) => {}
                        Residual::Tree(t) => kept.push(t),
                    }
                }
                match kept.len() {
                    0 => Residual::Const(false),
                    1 => Residual::Tree(kept.into_iter().next().unwrap()),
                    _ => Residual::Tree(Condition::Or(kept)),
                }
            }
            Condition::Not(inner) => match inner.partial_eval(ctx) {
                Residual::Const(b) => Residual::Const(!b),
                Residual::Tree(t) => Residual::Tree(Condition::Not(Box::new(t))),
            },
        }
    }

    /// Render into the portable expression JSON (spec §4.1, §6). Never fails
    /// for a well-formed tree.
    pub fn translate(&self) -> Result<serde_json::Value, PdpError> {
        match self {
            Condition::Leaf(leaf) => leaf.translate(),
            Condition::And(children) => Self::translate_combinator("AND", children),
            Condition::Or(children) => Self::translate_combinator("OR", children),
            Condition::Not(inner) => {
                let content = inner.translate()?;
                Ok(json!({ "op": "NOT", "content": [content] }))
            }
        }
    }

    fn translate_combinator(op: &str, children: &[Condition]) -> Result<serde_json::Value, PdpError> {
        let content: Result<Vec<_>, _> = children.iter().map(Condition::translate).collect();
        Ok(json!({ "op": op, "content": content? }))
    }
}
