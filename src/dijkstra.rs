//! Full-scan single-source Dijkstra, used as the correctness oracle for the
//! recursive engine and exported for callers that want plain shortest paths.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::{DistKey, Error, Graph, Node, Result, Weight};

/// Complete shortest-path tree from `src`. Unreachable vertices keep an
/// infinite distance and no predecessor.
pub fn dijkstra(g: &Graph, src: Node) -> Result<(Vec<Weight>, Vec<Option<Node>>)> {
    let n = g.num_vertices();
    if src >= n {
        return Err(Error::InvalidIndex(src));
    }

    let mut dist = vec![Weight::INFINITY; n];
    let mut pred: Vec<Option<Node>> = vec![None; n];
    let mut heap: BinaryHeap<Reverse<DistKey>> = BinaryHeap::new();

    dist[src] = 0.0;
    heap.push(Reverse(DistKey::new(0.0, src)));

    while let Some(Reverse(key)) = heap.pop() {
        let u = key.vertex();
        if key.dist() != dist[u] {
            continue; // stale entry
        }
        for &(v, w) in g.neighbors(u)? {
            let nd = dist[u] + w;
            if nd < dist[v] {
                dist[v] = nd;
                pred[v] = Some(u);
                heap.push(Reverse(DistKey::new(nd, v)));
            }
        }
    }

    Ok((dist, pred))
}
