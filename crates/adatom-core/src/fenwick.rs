//! Fenwick (binary indexed) tree of non-negative weights.
//!
//! Supports append, point update and "first index whose prefix sum
//! exceeds a target" in O(log n).

#[derive(Debug, Clone, Default)]
pub struct FenwickTree {
    /// 1-based; `nodes[i]` covers `(i - lowbit(i), i]`.
    nodes: Vec<f64>,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

impl FenwickTree {
    pub fn new() -> Self {
        Self { nodes: vec![0.0] }
    }

    /// Builds a tree over `weights` in O(n).
    pub fn from_weights(weights: impl IntoIterator<Item = f64>) -> Self {
        let mut nodes = vec![0.0];
        nodes.extend(weights);
        let n = nodes.len() - 1;
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                nodes[parent] += nodes[i];
            }
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a weight at index `len()`.
    pub fn push(&mut self, weight: f64) {
        if self.nodes.is_empty() {
            self.nodes.push(0.0);
        }
        let i = self.nodes.len();
        let mut node = weight;
        let stop = i - lowbit(i);
        let mut j = i - 1;
        while j > stop {
            node += self.nodes[j];
            j -= lowbit(j);
        }
        self.nodes.push(node);
    }

    /// Adds `delta` to the weight at 0-based `index`.
    pub fn add(&mut self, index: usize, delta: f64) {
        let n = self.len();
        let mut i = index + 1;
        while i <= n {
            self.nodes[i] += delta;
            i += lowbit(i);
        }
    }

    /// Sum of weights `[0, end)`.
    pub fn prefix(&self, end: usize) -> f64 {
        let mut i = end.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.nodes[i];
            i -= lowbit(i);
        }
        sum
    }

    pub fn total(&self) -> f64 {
        self.prefix(self.len())
    }

    /// Smallest 0-based index whose inclusive prefix sum is strictly greater
    /// than `target`. Returns `len()` when no such index exists.
    pub fn find_exceeding(&self, target: f64) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        let mut pos = 0;
        let mut remaining = target;
        let mut step = 1usize << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= n && self.nodes[next] <= remaining {
                pos = next;
                remaining -= self.nodes[next];
            }
            step >>= 1;
        }
        pos
    }
}
