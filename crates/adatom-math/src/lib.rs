//! # adatom-math
//!
//! Geometry primitives for the adatom kMC engine.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`DVec3`)
//! - Periodic simulation box (remap, minimum-image distances)
//! - Uniform cell grid for radius queries under periodic boundaries

pub mod grid;
pub mod periodic;

pub use grid::CellGrid;
pub use periodic::PeriodicBox;

// Re-export glam types as the canonical math types for adatom.
pub use glam::DVec3;
