//! Exact integer-programming backends for [`BinaryProgram`].

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};

use crate::program::{BinaryProgram, Bound};

/// Terminal state of one solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Proven optimal; one value per column.
    Optimal { values: Vec<f64>, objective: f64 },
    Infeasible,
    Unbounded,
    /// Stopped by the time limit before a proof either way.
    Unknown,
    Error(String),
}

/// An exact solver for 0/1 maximization programs.
pub trait BinarySolver {
    fn solve(&self, program: &BinaryProgram) -> SolveOutcome;
}

/// Branch-and-bound through `good_lp`'s pure-Rust `microlp` backend.
#[derive(Debug, Clone, Default)]
pub struct MicroLpSolver {
    /// Wall-clock bound on one solve. `None` waits for a proof.
    ///
    /// `microlp` cannot be interrupted: on expiry the worker thread is
    /// detached and keeps one core busy until its search ends. Every
    /// timed-out call leaves one such thread behind.
    pub time_limit: Option<Duration>,
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self { time_limit: Some(time_limit) }
    }
}

impl BinarySolver for MicroLpSolver {
    fn solve(&self, program: &BinaryProgram) -> SolveOutcome {
        let Some(limit) = self.time_limit else {
            return solve_microlp(program);
        };

        // The backend has no native limit, so the solve runs on a worker and
        // is abandoned if it overruns.
        let (tx, rx) = mpsc::channel();
        let owned = program.clone();
        let spawned = thread::Builder::new()
            .name("microlp-solve".into())
            .spawn(move || {
                let _ = tx.send(solve_microlp(&owned));
            });
        if let Err(e) = spawned {
            return SolveOutcome::Error(format!("cannot start solver thread: {e}"));
        }

        match rx.recv_timeout(limit) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                log::warn!("solve exceeded {:.1}s time limit", limit.as_secs_f64());
                SolveOutcome::Unknown
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                SolveOutcome::Error("solver thread exited without a result".into())
            }
        }
    }
}

fn solve_microlp(program: &BinaryProgram) -> SolveOutcome {
    if program.n_vars() == 0 {
        return SolveOutcome::Optimal { values: Vec::new(), objective: 0.0 };
    }

    let mut vars = ProblemVariables::new();
    let xs: Vec<Variable> = (0..program.n_vars())
        .map(|_| vars.add(variable().binary()))
        .collect();

    let mut objective: Expression = 0.into();
    for (&x, &c) in xs.iter().zip(&program.objective) {
        objective += c * x;
    }

    let mut model = vars
        .maximise(objective)
        .using(good_lp::solvers::microlp::microlp);
    for row in &program.constraints {
        let mut lhs: Expression = 0.into();
        for &(col, coeff) in &row.terms {
            lhs += coeff * xs[col];
        }
        let c = match row.bound {
            Bound::AtMost(rhs) => constraint!(lhs <= rhs),
            Bound::AtLeast(rhs) => constraint!(lhs >= rhs),
        };
        model.add_constraint(c);
    }

    match model.solve() {
        Ok(solution) => {
            let values: Vec<f64> = xs.iter().map(|&x| solution.value(x)).collect();
            let objective = program.objective_value(&values);
            SolveOutcome::Optimal { values, objective }
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::Infeasible,
        Err(ResolutionError::Unbounded) => SolveOutcome::Unbounded,
        Err(e) => SolveOutcome::Error(e.to_string()),
    }
}
