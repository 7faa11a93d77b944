//! Status transition tables
//!
//! Every lifecycle status enum implements [`Lifecycle`], whose `allowed_next`
//! is an exhaustive `match` over the closed enumeration. An unknown status
//! string never reaches the table: it fails to parse with [`UnknownStatus`].

use std::fmt;
use thiserror::Error;

/// A status string that names no member of the enumeration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {entity} status: {value}")]
pub struct UnknownStatus {
    pub entity: &'static str,
    pub value: String,
}

impl UnknownStatus {
    pub fn new(entity: &'static str, value: impl Into<String>) -> Self {
        Self {
            entity,
            value: value.into(),
        }
    }
}

/// A requested status change that the table does not permit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition<S> {
    pub from: S,
    pub to: S,
    /// The states reachable from `from`
    pub allowed: Vec<S>,
}

impl<S: Lifecycle> fmt::Display for InvalidTransition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let allowed: Vec<&str> = self.allowed.iter().map(|s| s.as_wire()).collect();
        write!(
            f,
            "Invalid {} status transition from {} to {} (allowed: [{}])",
            S::ENTITY,
            self.from.as_wire(),
            self.to.as_wire(),
            allowed.join(", ")
        )
    }
}

impl<S: Lifecycle> std::error::Error for InvalidTransition<S> {}

/// A closed set of states with a static transition table
pub trait Lifecycle: Copy + Eq + fmt::Debug + 'static {
    /// Name of the entity the states belong to, used in error messages
    const ENTITY: &'static str;

    /// Every state, in declaration order
    fn all() -> &'static [Self];

    /// States reachable in one step, excluding the state itself
    fn allowed_next(self) -> &'static [Self];

    /// Wire name (SCREAMING_SNAKE_CASE)
    fn as_wire(&self) -> &'static str;

    /// Self-transition is always permitted as an idempotent no-op
    fn is_valid_transition(from: Self, to: Self) -> bool {
        from == to || from.allowed_next().contains(&to)
    }

    fn validate_transition(from: Self, to: Self) -> Result<(), InvalidTransition<Self>> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from,
                to,
                allowed: from.allowed_next().to_vec(),
            })
        }
    }

    fn is_final(self) -> bool {
        self.allowed_next().is_empty()
    }
}

/// Declares a status enum with wire names, `Display`, case-insensitive
/// `FromStr`, and string serde.
///
/// Extra `| "ALIAS"` names are accepted when parsing but never emitted.
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::transition::UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $( $wire $(| $alias)* => Ok($name::$variant), )+
                    _ => Err($crate::transition::UnknownStatus::new(
                        <$name as $crate::transition::Lifecycle>::ENTITY,
                        s,
                    )),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use status_enum;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::WarrantyClaimStatus;

    #[test]
    fn test_invalid_transition_message_lists_allowed() {
        let err = WarrantyClaimStatus::validate_transition(
            WarrantyClaimStatus::Submitted,
            WarrantyClaimStatus::Completed,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("from SUBMITTED to COMPLETED"));
        assert!(message.contains("MANAGER_REVIEW, REJECTED"));
    }

    #[test]
    fn test_unknown_status_names_entity() {
        let err = "ARCHIVED".parse::<WarrantyClaimStatus>().unwrap_err();
        assert_eq!(err.entity, "WarrantyClaim");
        assert_eq!(err.value, "ARCHIVED");
    }
}
