//! Orthorhombic simulation box with per-axis periodicity.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Axis-aligned box `[lo, hi)` with independent periodic flags per axis.
///
/// Surface-growth setups are typically periodic in x and y and open in z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodicBox {
    pub lo: DVec3,
    pub hi: DVec3,
    pub periodic: [bool; 3],
}

impl PeriodicBox {
    pub fn new(lo: DVec3, hi: DVec3, periodic: [bool; 3]) -> Self {
        Self { lo, hi, periodic }
    }

    /// Fully periodic cube of edge `length` starting at the origin.
    pub fn cubic(length: f64) -> Self {
        Self::new(DVec3::ZERO, DVec3::splat(length), [true; 3])
    }

    /// Slab periodic in x/y and open along z.
    pub fn slab(lx: f64, ly: f64, lz: f64) -> Self {
        Self::new(DVec3::ZERO, DVec3::new(lx, ly, lz), [true, true, false])
    }

    /// Edge lengths.
    #[inline]
    pub fn lengths(&self) -> DVec3 {
        self.hi - self.lo
    }

    pub fn volume(&self) -> f64 {
        let l = self.lengths();
        l.x * l.y * l.z
    }

    /// Wraps a point back into the box along every periodic axis.
    /// Open axes are left untouched.
    pub fn remap(&self, p: DVec3) -> DVec3 {
        let mut out = p.to_array();
        let lo = self.lo.to_array();
        let len = self.lengths().to_array();
        for axis in 0..3 {
            if !self.periodic[axis] || len[axis] <= 0.0 {
                continue;
            }
            let mut x = lo[axis] + (out[axis] - lo[axis]).rem_euclid(len[axis]);
            // rem_euclid can round up to exactly len for tiny negative inputs
            if x >= lo[axis] + len[axis] {
                x = lo[axis];
            }
            out[axis] = x;
        }
        DVec3::from_array(out)
    }

    /// Shortest periodic image of a displacement vector.
    pub fn minimum_image(&self, d: DVec3) -> DVec3 {
        let mut out = d.to_array();
        let len = self.lengths().to_array();
        for axis in 0..3 {
            if !self.periodic[axis] || len[axis] <= 0.0 {
                continue;
            }
            out[axis] -= len[axis] * (out[axis] / len[axis]).round();
        }
        DVec3::from_array(out)
    }

    /// Minimum-image displacement from `a` to `b`.
    #[inline]
    pub fn delta(&self, a: DVec3, b: DVec3) -> DVec3 {
        self.minimum_image(b - a)
    }

    #[inline]
    pub fn distance_sq(&self, a: DVec3, b: DVec3) -> f64 {
        self.delta(a, b).length_squared()
    }

    /// True when `p` lies inside the box along every axis.
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.lo).all() && p.cmplt(self.hi).all()
    }
}

impl Default for PeriodicBox {
    fn default() -> Self {
        Self::cubic(1.0)
    }
}
