use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SelectionError};

/// Run configuration. Defaults match the reference study: half the total
/// cost, a quarter of the total area, parcels of at least 0.1 km².
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionParams {
    /// Fraction of total cost the selection may spend, in [0, 1].
    pub budget_fraction: f64,
    /// Fraction of total area the selection must cover, in [0, 1].
    pub area_fraction: f64,
    /// Parcels smaller than this are dropped before adjacency is built.
    pub min_parcel_area_km2: f64,
    /// Wall-clock bound on the solve; `None` waits for a proof.
    pub time_limit_secs: Option<f64>,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            budget_fraction: 0.5,
            area_fraction: 0.25,
            min_parcel_area_km2: 0.1,
            time_limit_secs: None,
        }
    }
}

impl SelectionParams {
    pub fn new(budget_fraction: f64, area_fraction: f64) -> Self {
        Self { budget_fraction, area_fraction, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        check_fraction("budget_fraction", self.budget_fraction)?;
        check_fraction("area_fraction", self.area_fraction)?;
        if !(self.min_parcel_area_km2.is_finite() && self.min_parcel_area_km2 >= 0.0) {
            return Err(SelectionError::InvalidParameter(format!(
                "min_parcel_area_km2 must be a non-negative number, got {}",
                self.min_parcel_area_km2
            )));
        }
        self.time_limit()?;
        Ok(())
    }

    /// The solve bound as a `Duration`. Rejects non-positive, non-finite and
    /// unrepresentably large values.
    pub fn time_limit(&self) -> Result<Option<Duration>> {
        let Some(secs) = self.time_limit_secs else {
            return Ok(None);
        };
        let invalid = || {
            SelectionError::InvalidParameter(format!(
                "time_limit_secs must be a positive number of seconds, got {secs}"
            ))
        };
        if secs.is_nan() || secs <= 0.0 {
            return Err(invalid());
        }
        Duration::try_from_secs_f64(secs).map(Some).map_err(|_| invalid())
    }
}

fn check_fraction(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SelectionError::InvalidParameter(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}
