//! Uniform cell grid for neighbor candidate lookup.
//!
//! Partitions the box into cells at least `cell_size` wide and bins
//! handles into cells. Radius queries visit only the cells the query
//! sphere can touch, wrapping cell indices along periodic axes.

use std::collections::HashMap;

use glam::DVec3;

use crate::periodic::PeriodicBox;

type CellKey = (i64, i64, i64);

/// Cell grid over a [`PeriodicBox`], storing opaque `u64` handles.
#[derive(Debug, Clone)]
pub struct CellGrid {
    bounds: PeriodicBox,
    /// Effective cell width per axis.
    cell: [f64; 3],
    /// Cell count per periodic axis (unused on open axes).
    counts: [i64; 3],
    cells: HashMap<CellKey, Vec<u64>>,
    len: usize,
}

impl CellGrid {
    /// Creates an empty grid. `cell_size` is clamped to a small positive minimum.
    pub fn new(bounds: PeriodicBox, cell_size: f64) -> Self {
        let cell_size = cell_size.max(1e-6);
        let lengths = bounds.lengths().to_array();
        let mut cell = [cell_size; 3];
        let mut counts = [1_i64; 3];
        for axis in 0..3 {
            if bounds.periodic[axis] && lengths[axis] > 0.0 {
                let n = (lengths[axis] / cell_size).floor().max(1.0) as i64;
                counts[axis] = n;
                cell[axis] = lengths[axis] / n as f64;
            }
        }
        Self {
            bounds,
            cell,
            counts,
            cells: HashMap::new(),
            len: 0,
        }
    }

    fn cell_key(&self, p: DVec3) -> CellKey {
        let rel = (p - self.bounds.lo).to_array();
        let mut key = [0_i64; 3];
        for axis in 0..3 {
            let mut c = (rel[axis] / self.cell[axis]).floor() as i64;
            if self.bounds.periodic[axis] {
                c = c.rem_euclid(self.counts[axis]);
            }
            key[axis] = c;
        }
        (key[0], key[1], key[2])
    }

    /// Number of handles stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    pub fn insert(&mut self, handle: u64, p: DVec3) {
        let key = self.cell_key(p);
        self.cells.entry(key).or_default().push(handle);
        self.len += 1;
    }

    /// Removes `handle` from the cell containing `p`. Returns false when absent.
    pub fn remove(&mut self, handle: u64, p: DVec3) -> bool {
        let key = self.cell_key(p);
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };
        let Some(idx) = bucket.iter().position(|&h| h == handle) else {
            return false;
        };
        bucket.swap_remove(idx);
        if bucket.is_empty() {
            self.cells.remove(&key);
        }
        self.len -= 1;
        true
    }

    /// Handles in every cell the sphere `(center, radius)` may overlap.
    ///
    /// This is a superset of the true neighbors; callers filter by distance.
    pub fn candidates(&self, center: DVec3, radius: f64) -> Vec<u64> {
        let center_key = self.cell_key(center);
        let center_arr = [center_key.0, center_key.1, center_key.2];

        let mut ranges: [Vec<i64>; 3] = [Vec::new(), Vec::new(), Vec::new()];
        for axis in 0..3 {
            let reach = (radius / self.cell[axis]).ceil() as i64;
            let c = center_arr[axis];
            if self.bounds.periodic[axis] {
                let n = self.counts[axis];
                if 2 * reach + 1 >= n {
                    ranges[axis] = (0..n).collect();
                } else {
                    ranges[axis] = (c - reach..=c + reach).map(|i| i.rem_euclid(n)).collect();
                }
            } else {
                ranges[axis] = (c - reach..=c + reach).collect();
            }
        }

        let mut out = Vec::new();
        for &x in &ranges[0] {
            for &y in &ranges[1] {
                for &z in &ranges[2] {
                    if let Some(bucket) = self.cells.get(&(x, y, z)) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }
        out
    }
}
