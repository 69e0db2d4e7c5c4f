// (C) Copyright IBM 2025
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Identification of the sector holding the global ground state.
//!
//! Tapering splits the spectrum of the original operator across the `2^k` sectors, and only the
//! sector attaining the global minimum reproduces the untapered ground energy.  Finding it
//! means calling an external eigensolver once per sector and scanning for the smallest result.

use rayon::prelude::*;

use z2taper_pauli::{getenv_use_multiple_threads, PauliSum};

use crate::taper::TaperedOperator;

/// Below this many sectors the parallel scan falls back to the sequential one.
const PARALLEL_SECTOR_THRESHOLD: usize = 4;

/// An external solver producing the lowest eigenvalue of an operator.
///
/// The scan functions call [MinimumEigensolver::minimum_eigenvalue] exactly once per sector, so
/// stateful solvers can count on one evaluation per reduced operator.
pub trait MinimumEigensolver {
    type Error;

    /// The smallest eigenvalue of the operator.
    fn minimum_eigenvalue(&self, operator: &PauliSum) -> Result<f64, Self::Error>;
}

/// The winner of a sector scan: a position into the scanned slice and its lowest eigenvalue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorMinimum {
    pub index: usize,
    pub eigenvalue: f64,
}

/// Scan the tapered sectors sequentially for the lowest eigenvalue.
///
/// Comparison is strict less-than, so ties keep the earliest sector.  An empty slice yields
/// `None`; a solver failure is returned immediately without consulting later sectors.
pub fn minimum_sector<S>(
    tapered: &[TaperedOperator],
    solver: &S,
) -> Result<Option<SectorMinimum>, S::Error>
where
    S: MinimumEigensolver,
{
    let mut best: Option<SectorMinimum> = None;
    for (index, entry) in tapered.iter().enumerate() {
        let eigenvalue = solver.minimum_eigenvalue(entry.operator())?;
        if best.map_or(true, |b| eigenvalue < b.eigenvalue) {
            best = Some(SectorMinimum { index, eigenvalue });
        }
    }
    Ok(best)
}

/// Scan the tapered sectors with one solver call per rayon task.
///
/// All results are collected in sector order first and the reduction then replays the
/// sequential tie rule, so the winner (and, on failure, the reported error) is identical to
/// [minimum_sector] bit for bit.  Small inputs and environments that disable threading use the
/// sequential scan directly.
pub fn minimum_sector_parallel<S>(
    tapered: &[TaperedOperator],
    solver: &S,
) -> Result<Option<SectorMinimum>, S::Error>
where
    S: MinimumEigensolver + Sync,
    S::Error: Send,
{
    if tapered.len() < PARALLEL_SECTOR_THRESHOLD || !getenv_use_multiple_threads() {
        return minimum_sector(tapered, solver);
    }
    let results: Vec<Result<f64, S::Error>> = tapered
        .par_iter()
        .map(|entry| solver.minimum_eigenvalue(entry.operator()))
        .collect();
    let mut best: Option<SectorMinimum> = None;
    for (index, result) in results.into_iter().enumerate() {
        let eigenvalue = result?;
        if best.map_or(true, |b| eigenvalue < b.eigenvalue) {
            best = Some(SectorMinimum { index, eigenvalue });
        }
    }
    Ok(best)
}
