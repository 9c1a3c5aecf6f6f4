//! Directed graph view: adjacency lists plus the derived recursion
//! parameters k and t, fixed at construction.

use crate::{Error, Node, Result, Weight};

/// Read-only during a BMSSP run. Vertices are 0..n-1; self-loops and
/// parallel edges are allowed (the relaxation dominates them naturally).
#[derive(Clone, Debug)]
pub struct Graph {
    adj: Vec<Vec<(Node, Weight)>>,
    k: usize,
    t: usize,
}

impl Graph {
    pub fn new(n: usize) -> Self {
        // k = floor(cbrt(ln n)), t = floor(cbrt(ln n)^2), both at least 1.
        let c = (n as f64).ln().max(0.0).cbrt();
        let k = (c.floor() as usize).max(1);
        let t = ((c * c).floor() as usize).max(1);
        Self {
            adj: vec![Vec::new(); n],
            k,
            t,
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.adj.len()
    }

    pub fn num_edges(&self) -> usize {
        self.adj.iter().map(|v| v.len()).sum()
    }

    /// Bellman-Ford round count and base-case settle cap.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Recursion branching exponent.
    pub fn t(&self) -> usize {
        self.t
    }

    pub fn add_edge(&mut self, u: Node, v: Node, w: Weight) -> Result<()> {
        let n = self.adj.len();
        if u >= n {
            return Err(Error::InvalidIndex(u));
        }
        if v >= n {
            return Err(Error::InvalidIndex(v));
        }
        if !w.is_finite() || w < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "edge weight {w} must be finite and non-negative"
            )));
        }
        self.adj[u].push((v, w));
        Ok(())
    }

    pub fn add_undirected_edge(&mut self, u: Node, v: Node, w: Weight) -> Result<()> {
        self.add_edge(u, v, w)?;
        self.add_edge(v, u, w)
    }

    pub fn neighbors(&self, u: Node) -> Result<&[(Node, Weight)]> {
        self.adj
            .get(u)
            .map(Vec::as_slice)
            .ok_or(Error::InvalidIndex(u))
    }

    pub fn memory_estimate_bytes(&self) -> usize {
        let n = self.adj.len();
        let m = self.num_edges();
        let edge_bytes = m * (std::mem::size_of::<Node>() + std::mem::size_of::<Weight>());
        let vec_headers = (n + 1) * 3 * std::mem::size_of::<usize>();
        let dist_bytes = n * std::mem::size_of::<Weight>();
        let pred_bytes = n * std::mem::size_of::<Option<Node>>();
        edge_bytes + vec_headers + dist_bytes + pred_bytes
    }
}
