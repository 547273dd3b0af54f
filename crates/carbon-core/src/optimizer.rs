//! Budget- and coverage-constrained maximum-carbon independent set.
//!
//! One binary column per parcel. Rows: the budget cap, one `x_i + x_j ≤ 1`
//! per touching pair, and the minimum-coverage floor. The solved assignment
//! is re-checked against all three families before it is returned.

use crate::adjacency::Adjacency;
use crate::error::{Result, SelectionError};
use crate::params::SelectionParams;
use crate::parcel::Parcel;
use crate::program::{BinaryProgram, LinearConstraint};
use crate::selection::{Selection, Totals};
use crate::solver::{BinarySolver, MicroLpSolver, SolveOutcome};

/// Largest distance from 0 or 1 accepted for a solved binary column.
pub const BINARY_TOLERANCE: f64 = 1e-6;
/// Relative slack allowed when re-checking budget and coverage.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

pub const BUDGET_ROW: &str = "budget";
pub const COVERAGE_ROW: &str = "min_area";

/// Solve with the default backend, honouring `params.time_limit_secs`.
pub fn optimize(
    parcels: &[Parcel],
    adjacency: &Adjacency,
    params: &SelectionParams,
) -> Result<Selection> {
    params.validate()?;
    let solver = MicroLpSolver { time_limit: params.time_limit()? };
    optimize_with(&solver, parcels, adjacency, params)
}

/// Solve with an explicit backend.
///
/// `adjacency` must be defined over exactly `parcels.len()` indices in the
/// same order.
pub fn optimize_with<S: BinarySolver + ?Sized>(
    solver: &S,
    parcels: &[Parcel],
    adjacency: &Adjacency,
    params: &SelectionParams,
) -> Result<Selection> {
    params.validate()?;
    if adjacency.len() != parcels.len() {
        return Err(SelectionError::InvalidParameter(format!(
            "adjacency covers {} parcels but {} were given",
            adjacency.len(),
            parcels.len()
        )));
    }

    let overall_totals = Totals::of(parcels);
    let budget = params.budget_fraction * overall_totals.cost;
    let required_area_km2 = params.area_fraction * overall_totals.area_km2;
    let finish = |selected: Vec<usize>| Selection {
        selected_totals: Totals::of_selection(parcels, &selected),
        selected,
        overall_totals,
        budget_fraction: params.budget_fraction,
        area_fraction: params.area_fraction,
        budget,
        required_area_km2,
    };

    if parcels.is_empty() {
        return Ok(finish(Vec::new()));
    }

    let program = build_program(parcels, adjacency, budget, required_area_km2);
    log::info!(
        "solving: {} variables, {} constraints ({} non-adjacency), budget {:.3}, min area {:.3} km²",
        program.n_vars(),
        program.constraints.len(),
        adjacency.pair_count(),
        budget,
        required_area_km2
    );

    let values = match solver.solve(&program) {
        SolveOutcome::Optimal { values, objective } => {
            log::info!("optimal objective {objective:.3}");
            values
        }
        SolveOutcome::Infeasible => {
            return Err(SelectionError::ModelInfeasible {
                budget_fraction: params.budget_fraction,
                area_fraction: params.area_fraction,
            })
        }
        SolveOutcome::Unknown => {
            return Err(SelectionError::SolveTimedOut {
                limit_secs: params.time_limit_secs.unwrap_or_default(),
            })
        }
        SolveOutcome::Unbounded => {
            return Err(SelectionError::Solver(
                "solver reported an unbounded objective for a binary program".into(),
            ))
        }
        SolveOutcome::Error(msg) => return Err(SelectionError::Solver(msg)),
    };

    let selection = finish(extract_selected(&values, parcels.len())?);
    verify(&selection, adjacency)?;
    Ok(selection)
}

/// The integer program for one run. Non-adjacency rows are emitted once per
/// unordered pair.
pub fn build_program(
    parcels: &[Parcel],
    adjacency: &Adjacency,
    budget: f64,
    required_area_km2: f64,
) -> BinaryProgram {
    let mut program = BinaryProgram::new(parcels.iter().map(|p| p.carbon).collect());

    program.add(LinearConstraint::at_most(
        BUDGET_ROW,
        parcels.iter().enumerate().map(|(i, p)| (i, p.cost)).collect(),
        budget,
    ));

    for (i, j) in adjacency.pairs() {
        program.add(LinearConstraint::at_most(
            format!("apart_{i}_{j}"),
            vec![(i, 1.0), (j, 1.0)],
            1.0,
        ));
    }

    program.add(LinearConstraint::at_least(
        COVERAGE_ROW,
        parcels.iter().enumerate().map(|(i, p)| (i, p.area_km2)).collect(),
        required_area_km2,
    ));

    program
}

/// Indices whose column is 1. Anything not within [`BINARY_TOLERANCE`] of
/// 0 or 1 is a solver contract violation.
fn extract_selected(values: &[f64], n: usize) -> Result<Vec<usize>> {
    if values.len() != n {
        return Err(SelectionError::Solver(format!(
            "solver returned {} values for {n} variables",
            values.len()
        )));
    }
    let mut selected = Vec::new();
    for (i, &v) in values.iter().enumerate() {
        if (v - 1.0).abs() <= BINARY_TOLERANCE {
            selected.push(i);
        } else if v.abs() <= BINARY_TOLERANCE {
            continue;
        } else {
            // NaN lands here: it fails both comparisons above.
            return Err(SelectionError::Solver(format!(
                "variable x_{i} = {v} is not binary"
            )));
        }
    }
    Ok(selected)
}

/// Re-check a solved selection against every constraint family.
pub fn verify(selection: &Selection, adjacency: &Adjacency) -> Result<()> {
    for &i in &selection.selected {
        if let Some(&j) = adjacency
            .neighbors(i)
            .iter()
            .find(|&&j| j > i && selection.contains(j))
        {
            return Err(SelectionError::InvariantViolation(format!(
                "touching parcels {i} and {j} are both selected"
            )));
        }
    }

    let cost = selection.selected_totals.cost;
    if cost > selection.budget + slack(selection.budget) {
        return Err(SelectionError::InvariantViolation(format!(
            "selected cost {cost} exceeds budget {}",
            selection.budget
        )));
    }

    let area = selection.selected_totals.area_km2;
    if area < selection.required_area_km2 - slack(selection.required_area_km2) {
        return Err(SelectionError::InvariantViolation(format!(
            "selected area {area} km² is below the required {} km²",
            selection.required_area_km2
        )));
    }
    Ok(())
}

fn slack(bound: f64) -> f64 {
    FEASIBILITY_TOLERANCE * bound.abs().max(1.0)
}
