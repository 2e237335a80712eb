//! Solver backends for the cluster-count allocation program.
//!
//! The allocation objective is quadratic, so the default backend talks to
//! Clarabel (a pure-Rust interior-point conic solver) directly: the box and
//! sum constraints become Zero/Nonnegative cones and the objective enters
//! through the P matrix. Other recognized solver names without a
//! quadratic-capable binding fall back to Clarabel with a warning; unknown
//! names are a configuration error.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use grt_core::{GrtError, GrtResult};
use tracing::warn;

/// Recognized solver names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Clarabel,
    Cbc,
    Highs,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Clarabel => "clarabel",
            SolverKind::Cbc => "cbc",
            SolverKind::Highs => "highs",
        }
    }

    /// Whether the backend can minimize a quadratic objective.
    pub fn supports_quadratic(&self) -> bool {
        matches!(self, SolverKind::Clarabel)
    }
}

impl std::str::FromStr for SolverKind {
    type Err = GrtError;

    fn from_str(s: &str) -> GrtResult<Self> {
        match s {
            "clarabel" => Ok(SolverKind::Clarabel),
            "cbc" => Ok(SolverKind::Cbc),
            "highs" => Ok(SolverKind::Highs),
            other => Err(GrtError::Config(format!("unknown solver `{other}`"))),
        }
    }
}

/// Minimal solver interface for the allocation step, so alternate backends
/// can be substituted without touching the allocation logic.
pub trait QpBackend {
    /// Minimize `sum_i (x_i - t_i)^2` subject to `sum_i x_i = total` and
    /// `1 <= x_i <= upper_i`. Returns the continuous minimizer.
    fn solve_box_sum_qp(&self, targets: &[f64], upper: &[f64], total: f64) -> GrtResult<Vec<f64>>;
}

/// Clarabel-backed quadratic solver.
pub struct ClarabelQp;

impl QpBackend for ClarabelQp {
    fn solve_box_sum_qp(&self, targets: &[f64], upper: &[f64], total: f64) -> GrtResult<Vec<f64>> {
        let p = targets.len();
        assert_eq!(upper.len(), p);
        if p == 0 {
            return Ok(Vec::new());
        }

        // Objective sum (x_i - t_i)^2 in Clarabel form (1/2) x'Px + q'x:
        // P = 2I, q = -2t (the constant term does not affect the argmin).
        let p_mat = CscMatrix::new(
            p,
            p,
            (0..=p).collect(),
            (0..p).collect(),
            vec![2.0; p],
        );
        let q: Vec<f64> = targets.iter().map(|t| -2.0 * t).collect();

        // Constraints as Ax + s = b, s in K:
        //   row 0:        sum(x) = total          (zero cone)
        //   rows 1..=p:   x_i <= upper_i          (nonnegative cone)
        //   rows p+1..2p: x_i >= 1                (nonnegative cone)
        let mut col_ptr = Vec::with_capacity(p + 1);
        let mut row_idx = Vec::with_capacity(3 * p);
        let mut values = Vec::with_capacity(3 * p);
        let mut nnz = 0;
        for j in 0..p {
            col_ptr.push(nnz);
            row_idx.push(0);
            values.push(1.0);
            row_idx.push(1 + j);
            values.push(1.0);
            row_idx.push(1 + p + j);
            values.push(-1.0);
            nnz += 3;
        }
        col_ptr.push(nnz);
        let a_mat = CscMatrix::new(1 + 2 * p, p, col_ptr, row_idx, values);

        let mut rhs = Vec::with_capacity(1 + 2 * p);
        rhs.push(total);
        rhs.extend_from_slice(upper);
        rhs.extend(std::iter::repeat(-1.0).take(p));

        let cones = [
            SupportedConeT::ZeroConeT(1),
            SupportedConeT::NonnegativeConeT(p),
            SupportedConeT::NonnegativeConeT(p),
        ];

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .build()
            .map_err(|e| GrtError::Solver(format!("clarabel settings error: {e:?}")))?;

        let mut solver = DefaultSolver::new(&p_mat, &q, &a_mat, &rhs, &cones, settings)
            .map_err(|e| GrtError::Solver(format!("clarabel initialization failed: {e:?}")))?;
        solver.solve();

        let solution = solver.solution;
        if !matches!(solution.status, SolverStatus::Solved) {
            return Err(GrtError::Solver(format!(
                "cluster allocation returned non-optimally: {:?}",
                solution.status
            )));
        }
        Ok(solution.x.clone())
    }
}

/// Resolve a solver name to a quadratic-capable backend, falling back to
/// Clarabel for recognized solvers that cannot handle the objective.
pub fn backend_for(kind: SolverKind) -> Box<dyn QpBackend> {
    if !kind.supports_quadratic() {
        warn!(
            "the configured solver `{}` does not support quadratic objectives; \
             falling back to `clarabel`",
            kind.as_str()
        );
    }
    Box::new(ClarabelQp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_names_parse() {
        assert_eq!("clarabel".parse::<SolverKind>().unwrap(), SolverKind::Clarabel);
        assert_eq!("cbc".parse::<SolverKind>().unwrap(), SolverKind::Cbc);
        assert!(matches!(
            "gurobi".parse::<SolverKind>(),
            Err(GrtError::Config(_))
        ));
    }

    #[test]
    fn test_unconstrained_optimum_is_returned() {
        let backend = ClarabelQp;
        let x = backend
            .solve_box_sum_qp(&[1.5, 2.5], &[10.0, 10.0], 4.0)
            .unwrap();
        assert!((x[0] - 1.5).abs() < 1e-4);
        assert!((x[1] - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_bind() {
        let backend = ClarabelQp;
        // Targets pull both below 1, the sum constraint and floors push back.
        let x = backend
            .solve_box_sum_qp(&[0.0, 0.0, 4.0], &[1.0, 1.0, 10.0], 6.0)
            .unwrap();
        assert!((x[0] - 1.0).abs() < 1e-4);
        assert!((x[1] - 1.0).abs() < 1e-4);
        assert!((x[2] - 4.0).abs() < 1e-4);
        assert!((x.iter().sum::<f64>() - 6.0).abs() < 1e-4);
    }
}
