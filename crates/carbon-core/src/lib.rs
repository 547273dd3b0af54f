//! Carbon-storage parcel selection.
//!
//! Pipeline: load parcels → filter small parcels → build the touching
//! relation → solve the budget/area-constrained independent-set program →
//! report the selection.

pub mod adjacency;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod optimizer;
pub mod params;
pub mod parcel;
pub mod program;
pub mod selection;
pub mod solver;

pub use adjacency::{build_adjacency, Adjacency};
pub use error::{Result, SelectionError};
pub use optimizer::{optimize, optimize_with};
pub use params::SelectionParams;
pub use parcel::{filter_by_min_area, Parcel};
pub use selection::{Selection, Totals};
pub use solver::{BinarySolver, MicroLpSolver, SolveOutcome};
