use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat record of user financial facts, persisted as pretty-printed JSON.
/// The calculators never read this directly; the shell resolves defaults
/// from it and passes plain scalars onward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialProfile {
    pub name: String,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub current_savings: f64,
    pub annual_income: f64,
    pub updated: Option<DateTime<Utc>>,
}

impl FinancialProfile {
    /// Monthly income left after expenses; may be negative.
    pub fn monthly_surplus(&self) -> f64 {
        self.monthly_income - self.monthly_expenses
    }

    /// Annual income for tax purposes, falling back to twelve months of
    /// the recorded monthly income when no annual figure is stored.
    pub fn annual_taxable_income(&self) -> f64 {
        if self.annual_income > 0.0 {
            self.annual_income
        } else {
            self.monthly_income * 12.0
        }
    }

    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}

pub fn default_path() -> PathBuf {
    std::env::var_os("NESTEGG_PROFILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("nestegg_profile.json"))
}

/// A missing file loads as the empty default profile.
pub fn load(path: &Path) -> Result<FinancialProfile, String> {
    if !path.exists() {
        return Ok(FinancialProfile::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read profile {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("invalid profile JSON in {}: {e}", path.display()))
}

pub fn save(path: &Path, profile: &FinancialProfile) -> Result<(), String> {
    let json = serde_json::to_string_pretty(profile)
        .map_err(|e| format!("failed to encode profile: {e}"))?;
    fs::write(path, json).map_err(|e| format!("failed to write profile {}: {e}", path.display()))
}
