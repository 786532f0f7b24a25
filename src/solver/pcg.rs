//! Preconditioned Conjugate Gradient (PCG) per Saad §9.2

use crate::core::traits::{InnerProduct, MatVec};
use crate::error::AmgError;
use crate::preconditioner::Preconditioner;
use crate::solver::LinearSolver;
use crate::utils::convergence::{Convergence, SolveReport};

/// Conjugate gradients with an optional stateful preconditioner.
///
/// The preconditioner lifecycle is honored: `pre` runs before the first
/// correction, every `apply` sees a zeroed output vector, and `post` runs
/// once the final iterate is accepted.
pub struct PcgSolver<T> {
    pub conv: Convergence<T>,
    pub monitor: Option<Box<dyn FnMut(usize, T)>>,
    pub residual_history: Vec<T>,
}

impl<T: Copy + num_traits::Float> PcgSolver<T> {
    pub fn new(tol: T, max_iters: usize) -> Self {
        Self {
            conv: Convergence { tol, max_iters },
            monitor: None,
            residual_history: Vec::new(),
        }
    }

    pub fn with_monitor<F>(mut self, f: F) -> Self
    where
        F: FnMut(usize, T) + 'static,
    {
        self.monitor = Some(Box::new(f));
        self
    }

    pub fn clear_history(&mut self) {
        self.residual_history.clear();
    }
}

impl<M, T> LinearSolver<M, T> for PcgSolver<T>
where
    M: MatVec<Vec<T>>,
    (): InnerProduct<Vec<T>, Scalar = T>,
    T: num_traits::Float + From<f64>,
{
    fn solve(
        &mut self,
        a: &M,
        mut pc: Option<&mut dyn Preconditioner<T>>,
        b: &[T],
        x: &mut [T],
    ) -> Result<SolveReport<T>, AmgError> {
        let n = b.len();
        assert_eq!(x.len(), n, "iterate length mismatch");
        let ip = ();

        // r = b - A x
        let mut ax = vec![T::zero(); n];
        a.matvec(&x.to_vec(), &mut ax);
        let mut r: Vec<T> = b.iter().zip(&ax).map(|(&bi, &axi)| bi - axi).collect();

        let res0 = ip.norm(&r);
        if let Some(ref mut monitor) = self.monitor {
            monitor(0, res0);
        }
        self.residual_history.push(res0);
        if res0 == T::zero() {
            return Ok(SolveReport {
                iterations: 0,
                initial_residual: res0,
                final_residual: res0,
                converged: true,
            });
        }

        if let Some(ref mut p) = pc {
            p.pre(x, b)?;
        }

        let mut z = vec![T::zero(); n];
        match pc {
            Some(ref mut p) => p.apply(&mut z, &r)?,
            None => z.copy_from_slice(&r),
        }
        let mut dir = z.clone();
        let mut rz = ip.dot(&r, &z);

        let mut report = SolveReport {
            iterations: 0,
            initial_residual: res0,
            final_residual: res0,
            converged: false,
        };
        let mut ap = vec![T::zero(); n];
        for i in 0..self.conv.max_iters {
            a.matvec(&dir, &mut ap);
            let dir_dot_adir = ip.dot(&dir, &ap);
            // Indefinite-matrix detection
            if dir_dot_adir <= T::zero() {
                return Err(AmgError::IndefiniteMatrix);
            }
            let alpha = rz / dir_dot_adir;
            for (xj, dj) in x.iter_mut().zip(&dir) {
                *xj = *xj + alpha * *dj;
            }
            for (rj, apj) in r.iter_mut().zip(&ap) {
                *rj = *rj - alpha * *apj;
            }

            let res_norm = ip.norm(&r);
            if let Some(ref mut monitor) = self.monitor {
                monitor(i + 1, res_norm);
            }
            self.residual_history.push(res_norm);
            let (stop, s) = self.conv.check(res_norm, res0, i + 1);
            report = s;
            if stop {
                break;
            }

            z.fill(T::zero());
            match pc {
                Some(ref mut p) => p.apply(&mut z, &r)?,
                None => z.copy_from_slice(&r),
            }
            let rz_new = ip.dot(&r, &z);
            let beta = rz_new / rz;
            // Indefinite-preconditioner detection
            if beta < T::zero() {
                return Err(AmgError::IndefinitePreconditioner);
            }
            for (dj, zj) in dir.iter_mut().zip(&z) {
                *dj = *zj + beta * *dj;
            }
            rz = rz_new;
        }

        if let Some(ref mut p) = pc {
            p.post(x)?;
        }
        Ok(report)
    }
}
