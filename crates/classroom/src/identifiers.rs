//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging — for example —
//! a [`ClassroomId`] with a [`UserId`] even though both are `u64` under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (store- or platform-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — store-assigned integers
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a classroom in the persistence gateway.
    ClassroomId
}

u64_id! {
    /// Identifies a registered user in the persistence gateway.
    ///
    /// Distinct from [`Username`], which is the user's login on the hosting
    /// platform; the two travel together on the membership record.
    UserId
}

u64_id! {
    /// Identifies a published assignment outline.
    AssignmentId
}

u64_id! {
    /// Identifies the grading rubric attached to an assignment outline.
    ///
    /// ClassHub references rubrics; it does not define their contents here.
    RubricId
}

u64_id! {
    /// Identifies the template repository an assignment is generated from.
    TemplateId
}

// ---------------------------------------------------------------------------
// Identifiers — platform-assigned integers
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a team on the hosting platform (platform-assigned integer).
    TeamId
}

u64_id! {
    /// Identifies a repository on the hosting platform (platform-assigned
    /// integer).
    ///
    /// This is the join key the bootstrap pipeline uses to resolve which
    /// assignment outline — and from there which classroom — a newly pushed
    /// repository belongs to.
    RepoId
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one inbound webhook delivery.
///
/// Taken from the platform's delivery header when present, generated fresh
/// otherwise; recorded on spans so all activity triggered by a single
/// delivery can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Generates a new random delivery identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`DeliveryId`] from an existing UUID (e.g. parsed from the
    /// delivery header).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (platform names)
// ---------------------------------------------------------------------------

string_id! {
    /// The hosting platform's organization login that owns a classroom's
    /// repositories and teams. Immutable once a classroom is created.
    OrgName
}

string_id! {
    /// A repository name within an organization (e.g. `"hw3-linked-lists"`).
    RepoName
}

string_id! {
    /// A team's URL-safe slug within an organization.
    TeamSlug
}

string_id! {
    /// A Git branch name (e.g. `"main"`, `"feedback"`).
    BranchName
}

string_id! {
    /// A Git commit SHA (40-character lowercase hex string).
    CommitSha
}

string_id! {
    /// A user's login on the hosting platform.
    Username
}

string_id! {
    /// The opaque random value of an invitation token.
    ///
    /// A bearer secret: minted once, never mutated, looked up by value on
    /// redemption.
    TokenValue
}

impl TokenValue {
    /// Encodes 16 bytes of caller-supplied entropy (128 bits, the minimum for
    /// a token value) as a lowercase hex string.
    pub fn from_entropy(bytes: [u8; 16]) -> Self {
        use std::fmt::Write;

        let mut value = String::with_capacity(32);
        for byte in bytes {
            // Writing to a String cannot fail; ignore the fmt::Result.
            let _ = write!(value, "{byte:02x}");
        }
        Self(value)
    }
}
