//! Garment categories accepted by the try-on endpoint.
//!
//! Callers use the vocabulary `upper_body`, `lower_body` and `dresses`. Each
//! synthesis backend maps these onto its own enum; that mapping lives next to
//! the backend in the server crate.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when resolving a [`GarmentCategory`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// The category is not recognized and the policy forbids a fallback.
    #[error("unknown garment category: {0}")]
    Unknown(String),
}

/// Kind of garment being tried on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GarmentCategory {
    #[default]
    UpperBody,
    LowerBody,
    Dresses,
}

impl GarmentCategory {
    /// Parse a caller-supplied category.
    ///
    /// Matching is case-insensitive and accepts the common aliases used by
    /// the various try-on models (`tops`, `bottoms`, `overall`, ...).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "upper_body" | "upper" | "upperbody" | "tops" | "top" => Some(Self::UpperBody),
            "lower_body" | "lower" | "lowerbody" | "bottoms" | "bottom" => Some(Self::LowerBody),
            "dresses" | "dress" | "overall" | "one_pieces" | "full_body" => Some(Self::Dresses),
            _ => None,
        }
    }

    /// Resolve a caller-supplied category under the given policy.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::Unknown` if the category is not recognized and
    /// the policy is [`CategoryPolicy::Reject`].
    pub fn resolve(s: &str, policy: CategoryPolicy) -> Result<Self, CategoryError> {
        match (Self::parse(s), policy) {
            (Some(category), _) => Ok(category),
            (None, CategoryPolicy::Fallback) => Ok(Self::default()),
            (None, CategoryPolicy::Reject) => Err(CategoryError::Unknown(s.to_string())),
        }
    }

    /// Canonical caller-facing name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpperBody => "upper_body",
            Self::LowerBody => "lower_body",
            Self::Dresses => "dresses",
        }
    }
}

impl fmt::Display for GarmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a category the server does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Treat unknown categories as upper body garments.
    #[default]
    Fallback,
    /// Reject unknown categories with a client error.
    Reject,
}

impl std::str::FromStr for CategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fallback" => Ok(Self::Fallback),
            "reject" => Ok(Self::Reject),
            _ => Err(format!("invalid category policy: {s}")),
        }
    }
}
