//! Projectable nutrition columns.

use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Calories,
    Fat,
    Protein,
}

impl Nutrient {
    /// Column identifier in `ingredient_nutritional_info`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calories => "calories",
            Self::Fat => "fat",
            Self::Protein => "protein",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calories" => Some(Self::Calories),
            "fat" => Some(Self::Fat),
            "protein" => Some(Self::Protein),
            _ => None,
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Calories, Self::Fat, Self::Protein]
    }

    /// Parse caller-supplied field names; any unknown name rejects the whole set.
    pub fn parse_all<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, AppError> {
        names
            .iter()
            .map(|n| {
                Self::from_str(n.as_ref()).ok_or_else(|| {
                    AppError::Validation(format!("unknown nutrition field '{}'", n.as_ref()))
                })
            })
            .collect()
    }

    /// Canonical order, duplicates removed.
    pub fn normalize(fields: &[Self]) -> Vec<Self> {
        let mut out = fields.to_vec();
        out.sort();
        out.dedup();
        out
    }
}
