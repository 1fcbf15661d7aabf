//! Type-safe identifier wrappers.
//!
//! Runtime entities (NPCs, sessions) use UUID v7 newtypes so identifiers
//! cannot be mixed up at compile time. Designer-authored configuration
//! entities (activities, routines, nodes, flags) use stable string keys
//! (e.g. `"activity:work_shop"`) because those keys are written by hand,
//! versioned with the world, and referenced across config documents.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a newtype wrapper around a stable string key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from any string-like value.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Return the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a non-player character.
    NpcId
}

define_id! {
    /// Unique identifier for a play session.
    SessionId
}

define_key! {
    /// Stable string key for an activity definition (e.g. `"activity:work_shop"`).
    ActivityId
}

define_key! {
    /// Stable string key for a routine graph (e.g. `"routine:shopkeeper_daily"`).
    RoutineId
}

define_key! {
    /// Stable string key for a node within a routine graph.
    NodeId
}

define_key! {
    /// Stable string key for a session flag.
    FlagKey
}

/// A reference to another NPC, either by literal identity or by a
/// relationship role resolved against current world bindings.
///
/// Roles let designers author activities like "dine with spouse" without
/// knowing which NPC holds the role in a given session.
///
/// The wire format is a single string so the reference can key maps:
/// `"npc:<uuid>"` for literal identities, and the role string verbatim
/// (conventionally `"role:spouse"`, `"role:employer"`) for roles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompanionRef {
    /// A literal NPC identity.
    Npc(NpcId),
    /// A relationship role, resolved per NPC at runtime.
    Role(String),
}

/// Wire prefix for literal NPC references.
const NPC_REF_PREFIX: &str = "npc:";

impl CompanionRef {
    /// Parse the canonical string form.
    ///
    /// Strings starting with `"npc:"` must carry a valid UUID; anything
    /// else is taken as a role name.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        match value.strip_prefix(NPC_REF_PREFIX) {
            Some(raw) => Ok(Self::Npc(NpcId(Uuid::parse_str(raw)?))),
            None => Ok(Self::Role(value.to_owned())),
        }
    }
}

impl core::fmt::Display for CompanionRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Npc(id) => write!(f, "{NPC_REF_PREFIX}{id}"),
            Self::Role(role) => write!(f, "{role}"),
        }
    }
}

impl Serialize for CompanionRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CompanionRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}
