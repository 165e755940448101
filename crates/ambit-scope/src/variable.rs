//! Variables: one record per logical binding.

use ambit_estree::NodeIndex;
use smallvec::SmallVec;

use crate::definition::Definition;
use crate::reference::ReferenceId;
use crate::scope::ScopeId;

/// Handle to a [`Variable`] owned by the
/// [`ScopeManager`](crate::ScopeManager).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariableId(pub u32);

impl VariableId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A locally scoped binding. Redeclarations of one name in one scope
/// accumulate into a single variable with several definitions.
#[derive(Debug)]
pub struct Variable {
    /// The name as written in source.
    pub name: String,
    /// The scope that declared this variable.
    pub scope: ScopeId,
    /// Defining occurrences, one per syntactic declaration.
    pub defs: SmallVec<[Definition; 1]>,
    /// The binding-position identifier nodes of those declarations.
    pub identifiers: Vec<NodeIndex>,
    /// Resolved references to this variable, in resolution order.
    pub references: Vec<ReferenceId>,
    /// True once a resolution to this variable passed through a dynamic
    /// scope.
    pub tainted: bool,
    /// False once the variable is captured across a function boundary
    /// (some resolving reference lives in a different variable scope), so
    /// it cannot live in plain stack storage.
    pub stack: bool,
}

impl Variable {
    pub(crate) fn new(name: &str, scope: ScopeId) -> Variable {
        Variable {
            name: name.to_string(),
            scope,
            defs: SmallVec::new(),
            identifiers: Vec::new(),
            references: Vec::new(),
            tainted: false,
            stack: true,
        }
    }
}
