use geo::Polygon;
use serde::Serialize;

use crate::error::{Result, SelectionError};
use crate::geometry;

/// One land unit. Its position in the filtered slice is its index for both
/// adjacency and optimization; `source_index` points back into the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Parcel {
    pub source_index: usize,
    pub geometry: Polygon<f64>,
    /// Carbon storage, non-negative.
    pub carbon: f64,
    /// Acquisition cost, non-negative.
    pub cost: f64,
    /// Derived from `geometry`, never supplied.
    pub area_km2: f64,
}

impl Parcel {
    /// Build a parcel, validating the geometry and attributes and deriving
    /// its area. `source_index` is used in error reports.
    pub fn new(source_index: usize, geometry: Polygon<f64>, carbon: f64, cost: f64) -> Result<Self> {
        check_attribute(source_index, "carbon", carbon)?;
        check_attribute(source_index, "cost", cost)?;
        geometry::validate(source_index, &geometry)?;
        let area_km2 = geometry::area_km2(&geometry);
        Ok(Self { source_index, geometry, carbon, cost, area_km2 })
    }
}

fn check_attribute(index: usize, field: &str, value: f64) -> Result<()> {
    let reason = if !value.is_finite() {
        "not a finite number"
    } else if value < 0.0 {
        "negative"
    } else {
        return Ok(());
    };
    Err(SelectionError::InvalidAttribute {
        index,
        field: field.to_string(),
        reason: format!("{value} is {reason}"),
    })
}

// ── Filtering ─────────────────────────────────────────────────────────────────

/// Parcels kept after the minimum-area filter, in input order.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub kept: Vec<Parcel>,
    pub removed: usize,
}

/// Drop parcels smaller than `min_area_km2`. The kept parcels are re-indexed
/// contiguously by their position in `kept`.
pub fn filter_by_min_area(parcels: Vec<Parcel>, min_area_km2: f64) -> FilterOutcome {
    let before = parcels.len();
    let kept: Vec<Parcel> = parcels
        .into_iter()
        .filter(|p| p.area_km2 >= min_area_km2)
        .collect();
    let removed = before - kept.len();
    if removed > 0 {
        log::warn!("{removed} of {before} parcels are below {min_area_km2} km² and were removed");
    }
    FilterOutcome { kept, removed }
}

// ── Descriptive ranges ────────────────────────────────────────────────────────

/// Inclusive min/max of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributeRange {
    pub min: f64,
    pub max: f64,
}

impl AttributeRange {
    /// `None` for an empty input.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Self { min: v, max: v }),
            Some(r) => Some(Self { min: r.min.min(v), max: r.max.max(v) }),
        })
    }
}

/// Attribute ranges over a parcel set, for the run log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParcelRanges {
    pub carbon: AttributeRange,
    pub cost: AttributeRange,
    pub area_km2: AttributeRange,
}

impl ParcelRanges {
    pub fn of(parcels: &[Parcel]) -> Option<Self> {
        Some(Self {
            carbon: AttributeRange::of(parcels.iter().map(|p| p.carbon))?,
            cost: AttributeRange::of(parcels.iter().map(|p| p.cost))?,
            area_km2: AttributeRange::of(parcels.iter().map(|p| p.area_km2))?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    /// Axis-aligned square parcel with `side` in metres.
    pub(crate) fn square_parcel(i: usize, x: f64, y: f64, side: f64, carbon: f64, cost: f64) -> Parcel {
        let geometry = polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ];
        Parcel::new(i, geometry, carbon, cost).unwrap()
    }

    #[test]
    fn area_is_derived_from_geometry() {
        let p = square_parcel(0, 0.0, 0.0, 2000.0, 1.0, 1.0);
        assert_relative_eq!(p.area_km2, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn negative_and_nan_attributes_are_rejected() {
        let geometry = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let err = Parcel::new(7, geometry.clone(), -1.0, 1.0).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidAttribute { index: 7, ref field, .. } if field == "carbon"));
        let err = Parcel::new(7, geometry, 1.0, f64::NAN).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidAttribute { ref field, .. } if field == "cost"));
    }

    #[test]
    fn filter_keeps_order_and_threshold_is_inclusive() {
        let parcels = vec![
            square_parcel(0, 0.0, 0.0, 1000.0, 1.0, 1.0),   // 1 km²
            square_parcel(1, 0.0, 0.0, 100.0, 1.0, 1.0),    // 0.01 km²
            square_parcel(2, 0.0, 0.0, 316.3, 1.0, 1.0),    // just above 0.1 km²
        ];
        let out = filter_by_min_area(parcels, 0.1);
        assert_eq!(out.removed, 1);
        let sources: Vec<usize> = out.kept.iter().map(|p| p.source_index).collect();
        assert_eq!(sources, vec![0, 2]);
    }

    #[test]
    fn ranges_cover_all_values() {
        let parcels = vec![
            square_parcel(0, 0.0, 0.0, 1000.0, 3.0, 10.0),
            square_parcel(1, 0.0, 0.0, 2000.0, 8.0, 2.0),
        ];
        let r = ParcelRanges::of(&parcels).unwrap();
        assert_eq!(r.carbon, AttributeRange { min: 3.0, max: 8.0 });
        assert_eq!(r.cost, AttributeRange { min: 2.0, max: 10.0 });
        assert!(ParcelRanges::of(&[]).is_none());
    }
}
