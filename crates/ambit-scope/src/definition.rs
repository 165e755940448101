//! Defining occurrences of variables.

use ambit_estree::{DeclarationKind, NodeIndex};

/// Discriminant of a [`DefinitionKind`], for callers that only need the
/// category.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DefinitionType {
    Variable,
    Parameter,
    FunctionName,
    ClassName,
    CatchClause,
    ImportBinding,
    ImplicitGlobalVariable,
}

/// The syntactic form a definition came from, with the fields valid for
/// that form.
#[derive(Clone, Debug)]
pub enum DefinitionKind {
    /// A `var`/`let`/`const` declarator.
    Variable {
        /// The `VariableDeclarator` node.
        declarator: NodeIndex,
        /// The enclosing `VariableDeclaration`.
        declaration: NodeIndex,
        /// Position among the declaration's declarators.
        index: usize,
        kind: DeclarationKind,
    },
    /// A function or arrow parameter.
    Parameter {
        /// The owning function node.
        function: NodeIndex,
        /// Position in the parameter list.
        index: usize,
        /// Whether the binding sits under a rest element.
        rest: bool,
    },
    /// The name of a function declaration or expression.
    FunctionName { function: NodeIndex },
    /// The name of a class declaration or expression.
    ClassName { class: NodeIndex },
    /// A catch-clause binding (possibly destructured).
    CatchClause { clause: NodeIndex },
    /// An import specifier's local name.
    ImportBinding {
        specifier: NodeIndex,
        declaration: NodeIndex,
    },
    /// A binding synthesized for an assignment to an undeclared name in
    /// non-strict code, once the global scope closes.
    ImplicitGlobalVariable { node: NodeIndex },
}

/// One declaration occurrence of a variable. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct Definition {
    /// The binding identifier (or, for catch clauses, the whole bound
    /// pattern) this definition names.
    pub name: NodeIndex,
    pub kind: DefinitionKind,
}

impl Definition {
    pub fn definition_type(&self) -> DefinitionType {
        match self.kind {
            DefinitionKind::Variable { .. } => DefinitionType::Variable,
            DefinitionKind::Parameter { .. } => DefinitionType::Parameter,
            DefinitionKind::FunctionName { .. } => DefinitionType::FunctionName,
            DefinitionKind::ClassName { .. } => DefinitionType::ClassName,
            DefinitionKind::CatchClause { .. } => DefinitionType::CatchClause,
            DefinitionKind::ImportBinding { .. } => DefinitionType::ImportBinding,
            DefinitionKind::ImplicitGlobalVariable { .. } => {
                DefinitionType::ImplicitGlobalVariable
            }
        }
    }

    /// The innermost enclosing syntax node of the definition.
    pub fn node(&self) -> NodeIndex {
        match self.kind {
            DefinitionKind::Variable { declarator, .. } => declarator,
            DefinitionKind::Parameter { function, .. } => function,
            DefinitionKind::FunctionName { function } => function,
            DefinitionKind::ClassName { class } => class,
            DefinitionKind::CatchClause { clause } => clause,
            DefinitionKind::ImportBinding { specifier, .. } => specifier,
            DefinitionKind::ImplicitGlobalVariable { node } => node,
        }
    }

    /// The enclosing statement node, where one exists (the
    /// `VariableDeclaration` of a declarator, the `ImportDeclaration` of
    /// a specifier).
    pub fn parent(&self) -> NodeIndex {
        match self.kind {
            DefinitionKind::Variable { declaration, .. } => declaration,
            DefinitionKind::ImportBinding { declaration, .. } => declaration,
            _ => NodeIndex::NONE,
        }
    }
}
