use thiserror::Error;

/// Every way a selection run can fail. No variant carries a partial selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// A polygon is malformed or degenerate; no adjacency can be assumed for it.
    #[error("invalid geometry for parcel {index}: {reason}")]
    Geometry { index: usize, reason: String },

    #[error("parcel {index} has an invalid `{field}` attribute: {reason}")]
    InvalidAttribute {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No assignment satisfies budget, non-adjacency and coverage at once.
    #[error(
        "no selection satisfies the constraints \
         (budget_fraction = {budget_fraction}, area_fraction = {area_fraction})"
    )]
    ModelInfeasible {
        budget_fraction: f64,
        area_fraction: f64,
    },

    /// The time limit expired before optimality or infeasibility was proven.
    #[error("solver stopped after {limit_secs}s without proving optimality or infeasibility")]
    SolveTimedOut { limit_secs: f64 },

    #[error("solver failure: {0}")]
    Solver(String),

    /// A post-solve check failed, which means the model was built wrong.
    #[error("selection invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),

    #[error("expected a GeoJSON FeatureCollection, found a {0}")]
    NotFeatureCollection(&'static str),
}

pub type Result<T> = std::result::Result<T, SelectionError>;
