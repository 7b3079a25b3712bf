//! Typed arena indices.
//!
//! Source entities (loaded from the description) and target entities (the
//! adapted code model) live in `Vec` arenas; these newtypes keep the two
//! index spaces apart so a record index can never be used to look up an enum.

use std::fmt::{Display, Formatter};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(usize);

        impl $name {
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            pub fn index(self) -> usize {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

arena_id!(
    /// Enum declared in the service description
    SourceEnumId,
    "enum"
);
arena_id!(
    /// Model declared in the service description
    SourceModelId,
    "model"
);
arena_id!(
    /// Discriminated union declared in the service description
    SourceUnionId,
    "union"
);
arena_id!(
    /// Client declared in the service description
    SourceClientId,
    "client"
);

arena_id!(EnumId, "Enum");
arena_id!(RecordId, "Record");
arena_id!(UnionId, "Union");
arena_id!(MarkerId, "Marker");
arena_id!(ClientId, "Client");
