//! Enum types for Ember entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// The reaction a user holds toward a post.
///
/// A user holds at most one reaction per post and may switch between the
/// two kinds. Serialized lowercase (`like` / `burn`) to match the wire
/// format of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Like,
    Burn,
}

impl InteractionType {
    /// Lowercase wire name, as used in error messages and routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Burn => "burn",
        }
    }

    /// Past-tense form for user-facing messages ("Post already liked").
    pub fn past_tense(&self) -> &'static str {
        match self {
            InteractionType::Like => "liked",
            InteractionType::Burn => "burned",
        }
    }

    /// The other reaction kind. Switching a reaction moves a count from
    /// `self.opposite()` to `self`.
    pub fn opposite(&self) -> Self {
        match self {
            InteractionType::Like => InteractionType::Burn,
            InteractionType::Burn => InteractionType::Like,
        }
    }
}

impl fmt::Display for InteractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionType::Like),
            "burn" => Ok(InteractionType::Burn),
            other => Err(format!("Unknown interaction type: {}", other)),
        }
    }
}

/// Entity type discriminator for storage errors and polymorphic
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Post,
    Interaction,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_roundtrip() {
        for ty in [InteractionType::Like, InteractionType::Burn] {
            let parsed: InteractionType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }

    #[test]
    fn test_interaction_type_serde_lowercase() {
        let json = serde_json::to_string(&InteractionType::Like).unwrap();
        assert_eq!(json, "\"like\"");
        let back: InteractionType = serde_json::from_str("\"burn\"").unwrap();
        assert_eq!(back, InteractionType::Burn);
    }

    #[test]
    fn test_interaction_type_unknown_rejected() {
        assert!("boost".parse::<InteractionType>().is_err());
    }

    #[test]
    fn test_opposite_is_involution() {
        assert_eq!(InteractionType::Like.opposite(), InteractionType::Burn);
        assert_eq!(InteractionType::Burn.opposite().opposite(), InteractionType::Burn);
    }
}
