//! Identifier occurrences and their read/write modes.

use ambit_estree::NodeIndex;
use bitflags::bitflags;

use crate::scope::ScopeId;
use crate::variable::VariableId;

/// Handle to a [`Reference`] owned by the
/// [`ScopeManager`](crate::ScopeManager).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceId(pub u32);

impl ReferenceId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Read/write mode of a reference. Compound assignment and the
    /// increment/decrement operators produce `RW`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ReferenceFlags: u8 {
        const READ = 0x1;
        const WRITE = 0x2;
        const RW = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Marker attached to a write reference in non-strict code whose target
/// was not (yet) known to be declared. If the name never resolves, the
/// global scope's closing pass turns the marker into an implicit-global
/// definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImplicitGlobalCandidate {
    /// The written binding identifier.
    pub pattern: NodeIndex,
    /// The assignment-like node the write came from.
    pub node: NodeIndex,
}

/// A single occurrence of an identifier in code.
#[derive(Debug)]
pub struct Reference {
    /// The identifier node.
    pub identifier: NodeIndex,
    /// The scope lexically containing the occurrence.
    pub from: ScopeId,
    /// Read/write mode.
    pub flags: ReferenceFlags,
    /// For writes, the expression being assigned; `NONE` otherwise.
    pub write_expr: NodeIndex,
    /// Whether this write covers only part of the written value (one
    /// target among several in a destructuring pattern).
    pub partial: bool,
    /// Whether this write is an initialization (declarator init, default
    /// value) rather than a reassignment.
    pub init: bool,
    /// The variable this reference resolved to, if any.
    pub resolved: Option<VariableId>,
    /// Whether resolution passed through a dynamic (`with`) scope.
    pub tainted: bool,
    pub maybe_implicit_global: Option<ImplicitGlobalCandidate>,
}

impl Reference {
    pub fn is_read(&self) -> bool {
        self.flags.contains(ReferenceFlags::READ)
    }

    pub fn is_write(&self) -> bool {
        self.flags.contains(ReferenceFlags::WRITE)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags == ReferenceFlags::READ
    }

    pub fn is_write_only(&self) -> bool {
        self.flags == ReferenceFlags::WRITE
    }

    pub fn is_read_write(&self) -> bool {
        self.flags == ReferenceFlags::RW
    }
}
