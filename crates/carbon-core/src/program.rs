//! Solver-independent 0/1 linear program: binary columns, one maximized
//! linear objective, linear inequality rows.

/// Right-hand side of one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    AtMost(f64),
    AtLeast(f64),
}

/// `Σ coeff · x[col]` compared against a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub label: String,
    pub terms: Vec<(usize, f64)>,
    pub bound: Bound,
}

impl LinearConstraint {
    pub fn at_most(label: impl Into<String>, terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self { label: label.into(), terms, bound: Bound::AtMost(rhs) }
    }

    pub fn at_least(label: impl Into<String>, terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        Self { label: label.into(), terms, bound: Bound::AtLeast(rhs) }
    }

    /// Left-hand side under `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(col, coeff)| coeff * values[col]).sum()
    }

    /// True when `values` satisfy this row within `tolerance`, scaled by
    /// the bound's magnitude.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let lhs = self.lhs(values);
        match self.bound {
            Bound::AtMost(rhs) => lhs <= rhs + tolerance * rhs.abs().max(1.0),
            Bound::AtLeast(rhs) => lhs >= rhs - tolerance * rhs.abs().max(1.0),
        }
    }
}

/// Maximize `Σ objective[i] · x[i]` over `x ∈ {0, 1}^n` subject to every row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryProgram {
    pub objective: Vec<f64>,
    pub constraints: Vec<LinearConstraint>,
}

impl BinaryProgram {
    pub fn new(objective: Vec<f64>) -> Self {
        Self { objective, constraints: Vec::new() }
    }

    pub fn n_vars(&self) -> usize {
        self.objective.len()
    }

    pub fn add(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().zip(values).map(|(c, v)| c * v).sum()
    }

    /// First row violated by `values`, if any.
    pub fn first_violation(&self, values: &[f64], tolerance: f64) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| !c.is_satisfied(values, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_evaluate_both_directions() {
        let le = LinearConstraint::at_most("cap", vec![(0, 2.0), (1, 3.0)], 4.0);
        let ge = LinearConstraint::at_least("floor", vec![(0, 1.0), (1, 1.0)], 1.0);
        assert!(le.is_satisfied(&[1.0, 0.0], 0.0));
        assert!(!le.is_satisfied(&[1.0, 1.0], 0.0));
        assert!(ge.is_satisfied(&[0.0, 1.0], 0.0));
        assert!(!ge.is_satisfied(&[0.0, 0.0], 0.0));
    }

    #[test]
    fn tolerance_absorbs_rounding() {
        let le = LinearConstraint::at_most("cap", vec![(0, 0.1), (1, 0.2)], 0.3);
        assert!(le.is_satisfied(&[1.0, 1.0], 1e-9));
    }

    #[test]
    fn first_violation_names_the_row() {
        let mut p = BinaryProgram::new(vec![1.0, 1.0]);
        p.add(LinearConstraint::at_most("pair", vec![(0, 1.0), (1, 1.0)], 1.0));
        assert_eq!(p.objective_value(&[1.0, 1.0]), 2.0);
        assert_eq!(p.first_violation(&[1.0, 1.0], 0.0).map(|c| c.label.as_str()), Some("pair"));
        assert!(p.first_violation(&[1.0, 0.0], 0.0).is_none());
    }
}
