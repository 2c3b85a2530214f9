//! Strongly typed handles into the source model arenas.
//!
//! Declarations, scopes, symbols and modules all live in flat vectors owned by
//! [`SourceModel`](super::SourceModel); everything else refers to them through
//! these handles, so annotations never hold references back into the tree.

use std::fmt;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            /// Position of the entry in its arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(DeclId);
define_id!(ScopeId);
define_id!(SymbolId);
define_id!(ModuleId);
