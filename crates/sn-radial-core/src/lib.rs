//! Implicit integrator for the radially symmetric Schrödinger–Newton equation.
//!
//! The [`numerics`] tree holds the per-step kernels, [`modules`] the
//! collaborators around them (initial states, snapshots, run directories,
//! progress) and the [`modules::driver`] that sequences a whole run.
//! [`modules::analysis`] reduces the snapshots of a finished run.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
