use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parcel::Parcel;

/// Sums of the three parcel attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub carbon: f64,
    pub cost: f64,
    pub area_km2: f64,
}

impl Totals {
    pub fn of<'a>(parcels: impl IntoIterator<Item = &'a Parcel>) -> Self {
        parcels.into_iter().fold(Self::default(), |acc, p| Self {
            carbon: acc.carbon + p.carbon,
            cost: acc.cost + p.cost,
            area_km2: acc.area_km2 + p.area_km2,
        })
    }

    /// Totals over `parcels[i]` for each `i` in `indices`.
    pub fn of_selection(parcels: &[Parcel], indices: &[usize]) -> Self {
        Self::of(indices.iter().map(|&i| &parcels[i]))
    }
}

/// Outcome of one optimization run, ready for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Selected parcel indices, ascending.
    pub selected: Vec<usize>,
    pub selected_totals: Totals,
    pub overall_totals: Totals,
    pub budget_fraction: f64,
    pub area_fraction: f64,
    /// `budget_fraction · overall_totals.cost`.
    pub budget: f64,
    /// `area_fraction · overall_totals.area_km2`.
    pub required_area_km2: f64,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selected.binary_search(&index).is_ok()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} parcels selected: {:?}", self.selected.len(), self.selected)?;
        writeln!(
            f,
            "total carbon storage {:.3} of {:.3} overall",
            self.selected_totals.carbon, self.overall_totals.carbon
        )?;
        writeln!(
            f,
            "total cost {:.3} against a budget of {:.3}",
            self.selected_totals.cost, self.budget
        )?;
        write!(
            f,
            "total area {:.3} km² of {:.3} km² overall (required {:.3} km²)",
            self.selected_totals.area_km2, self.overall_totals.area_km2, self.required_area_km2
        )
    }
}
