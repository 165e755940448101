//! Destructuring-pattern traversal.
//!
//! Shared by parameters, variable declarators, catch params, for-in/of
//! left-hand sides, and bare assignment targets. The visitor descends
//! array/object/rest/default sub-patterns, invoking the callback once per
//! bound leaf identifier, and collects every right-hand node (default
//! values, computed keys, member targets, call arguments) for the caller
//! to visit as ordinary expressions afterwards.

use ambit_estree::{AstArena, NodeIndex, NodeKind};

use crate::error::AnalyzeError;
use crate::referencer::Walker;

/// Context passed to the per-leaf callback.
pub(crate) struct PatternInfo<'a> {
    /// Whether the leaf is the pattern's own root node.
    pub top_level: bool,
    /// Whether the leaf sits under a rest element.
    pub rest: bool,
    /// The chain of default-value assignment nodes on the path to the
    /// leaf, outermost first.
    pub assignments: &'a [NodeIndex],
}

/// Whether a node can be an assignment target pattern.
pub(crate) fn is_pattern(arena: &AstArena, index: NodeIndex) -> bool {
    matches!(
        arena.kind(index),
        Some(
            NodeKind::Identifier
                | NodeKind::ObjectPattern
                | NodeKind::ArrayPattern
                | NodeKind::SpreadElement
                | NodeKind::RestElement
                | NodeKind::AssignmentPattern
        )
    )
}

pub(crate) struct PatternVisitor<'ast, 'opt> {
    arena: &'ast AstArena,
    walker: Walker<'opt>,
    root: NodeIndex,
    assignments: Vec<NodeIndex>,
    rest_elements: Vec<NodeIndex>,
    /// Right-hand nodes met along the way, for the caller to traverse.
    pub right_hand_nodes: Vec<NodeIndex>,
}

impl<'ast, 'opt> PatternVisitor<'ast, 'opt> {
    pub fn new(arena: &'ast AstArena, walker: Walker<'opt>, root: NodeIndex) -> Self {
        PatternVisitor {
            arena,
            walker,
            root,
            assignments: Vec::new(),
            rest_elements: Vec::new(),
            right_hand_nodes: Vec::new(),
        }
    }

    pub fn visit<F>(&mut self, index: NodeIndex, callback: &mut F) -> Result<(), AnalyzeError>
    where
        F: FnMut(NodeIndex, PatternInfo<'_>),
    {
        if index.is_none() {
            return Ok(());
        }
        let arena = self.arena;
        let Some(node) = arena.get(index) else {
            return Ok(());
        };
        match node.kind {
            NodeKind::Identifier => {
                let rest = self.rest_elements.last().is_some_and(|&rest| {
                    arena
                        .get(rest)
                        .and_then(|n| arena.get_argument(n))
                        .is_some_and(|data| data.argument == index)
                });
                callback(
                    index,
                    PatternInfo {
                        top_level: index == self.root,
                        rest,
                        assignments: &self.assignments,
                    },
                );
            }
            NodeKind::Property => {
                let Some(property) = arena.get_property(node) else {
                    return Ok(());
                };
                // A computed key is an ordinary expression, not a target.
                if property.computed {
                    self.right_hand_nodes.push(property.key);
                }
                // Shorthand or not, the bound name is the value side.
                self.visit(property.value, callback)?;
            }
            NodeKind::ArrayPattern | NodeKind::ArrayExpression => {
                let Some(list) = arena.get_list(node) else {
                    return Ok(());
                };
                for &element in &list.elements.nodes {
                    self.visit(element, callback)?;
                }
            }
            NodeKind::AssignmentPattern | NodeKind::AssignmentExpression => {
                let Some(expr) = arena.get_binary_expr(node) else {
                    return Ok(());
                };
                self.assignments.push(index);
                self.visit(expr.left, callback)?;
                self.right_hand_nodes.push(expr.right);
                self.assignments.pop();
            }
            NodeKind::RestElement => {
                let Some(data) = arena.get_argument(node) else {
                    return Ok(());
                };
                self.rest_elements.push(index);
                self.visit(data.argument, callback)?;
                self.rest_elements.pop();
            }
            NodeKind::SpreadElement => {
                let Some(data) = arena.get_argument(node) else {
                    return Ok(());
                };
                self.visit(data.argument, callback)?;
            }
            NodeKind::MemberExpression => {
                let Some(member) = arena.get_member_expr(node) else {
                    return Ok(());
                };
                if member.computed {
                    self.right_hand_nodes.push(member.property);
                }
                // The object is only read; the write lands on a property.
                self.right_hand_nodes.push(member.object);
            }
            NodeKind::CallExpression => {
                let Some(call) = arena.get_call_expr(node) else {
                    return Ok(());
                };
                for &argument in &call.arguments.nodes {
                    if argument.is_some() {
                        self.right_hand_nodes.push(argument);
                    }
                }
                self.visit(call.callee, callback)?;
            }
            // ObjectPattern and anything else: descend through the
            // declared child edges.
            _ => {
                let mut children = Vec::new();
                self.walker.children(arena, index, &mut children)?;
                for child in children {
                    self.visit(child, callback)?;
                }
            }
        }
        Ok(())
    }
}
