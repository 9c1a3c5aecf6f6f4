//! The recursive BMSSP engine and its driver.
//!
//! A level-l call owns a BatchHeap sized 2^((l-1)*t), pulls frontier batches
//! out of it, recurses one level down on each batch, relaxes the out-edges of
//! whatever the sub-call completed, and routes the affected vertices back into
//! the heap (or a deferred prepend bucket for keys under the sub-bound) until
//! a level-dependent completion target is reached or the heap drains.

use std::collections::HashSet;

use crate::base_case::base_case_bounded;
use crate::batch_heap::BatchHeap;
use crate::pivots::find_pivots_bounded;
use crate::{DistKey, Error, Graph, Node, Result, Weight};

/// Largest supported batch-size shift; 2^((level-1)*t) is clamped here so
/// the shift can never wrap.
const MAX_BATCH_SHIFT: usize = 30;

fn batch_size(level: usize, t: usize) -> usize {
    let shift = level
        .saturating_sub(1)
        .saturating_mul(t)
        .min(MAX_BATCH_SHIFT);
    1usize << shift
}

fn pow2_saturating(exp: usize) -> usize {
    if exp >= usize::BITS as usize - 1 {
        usize::MAX
    } else {
        1usize << exp
    }
}

pub(crate) fn bmssp_bounded(
    g: &Graph,
    dist: &mut [Weight],
    pred: &mut [Option<Node>],
    level: usize,
    bound: DistKey,
    frontier: &[Node],
) -> Result<(DistKey, Vec<Node>)> {
    if level == 0 {
        let mut refined = bound;
        let mut completed: Vec<Node> = Vec::new();
        let mut in_u: HashSet<Node> = HashSet::new();
        for &s in frontier {
            let (b, settled) = base_case_bounded(g, s, bound, dist, pred)?;
            refined = refined.min(b);
            for v in settled {
                if in_u.insert(v) {
                    completed.push(v);
                }
            }
        }
        return Ok((refined, completed));
    }

    let n = g.num_vertices();
    let k = g.k();
    let t = g.t();

    let (pivots, nearby) = find_pivots_bounded(g, bound, frontier, dist, pred)?;

    let mut heap = BatchHeap::new(batch_size(level, t), bound);
    let mut low = bound; // B'_0: smallest pivot key, or B when there are none
    for &p in &pivots {
        let key = DistKey::new(dist[p], p);
        low = low.min(key);
        heap.insert(p, key);
    }

    let target = k.saturating_mul(pow2_saturating(level.saturating_mul(t))).min(n);
    let mut completed: Vec<Node> = Vec::new();
    let mut in_u: HashSet<Node> = HashSet::new();

    while completed.len() < target {
        let (sub_bound, batch) = heap.pull();
        if batch.is_empty() {
            break;
        }

        let (sub_refined, sub_completed) =
            bmssp_bounded(g, dist, pred, level - 1, sub_bound, &batch)?;

        let finished: HashSet<Node> = sub_completed.iter().copied().collect();
        for &v in &sub_completed {
            if in_u.insert(v) {
                completed.push(v);
            }
        }

        let mut carry: Vec<(Node, DistKey)> = Vec::new();
        for &u in &sub_completed {
            for &(v, w) in g.neighbors(u)? {
                let nd = dist[u] + w;
                if nd > dist[v] {
                    continue;
                }
                if nd < dist[v] {
                    dist[v] = nd;
                    pred[v] = Some(u);
                }
                if in_u.contains(&v) {
                    continue;
                }
                // Equal-key hits still route: a vertex the pivot pass already
                // relaxed to its final distance re-enters the frontier here.
                let key = DistKey::new(nd, v);
                if sub_bound <= key && key < bound {
                    heap.insert(v, key);
                } else if sub_refined <= key && key < sub_bound {
                    carry.push((v, key));
                }
            }
        }

        // Re-offer frontier members the sub-call pulled but did not finish.
        for &s in &batch {
            if finished.contains(&s) {
                continue;
            }
            let key = DistKey::new(dist[s], s);
            if sub_refined <= key && key < sub_bound {
                carry.push((s, key));
            }
        }

        if !carry.is_empty() {
            heap.batch_prepend(carry);
        }
    }

    // Conservative refinement: min(B, max key over U, B'_0), regardless of
    // why the loop ended.
    let mut refined = low;
    if let Some(max_key) = completed.iter().map(|&v| DistKey::new(dist[v], v)).max() {
        refined = refined.min(max_key);
    }
    for &w in &nearby {
        if DistKey::new(dist[w], w) < refined && in_u.insert(w) {
            completed.push(w);
        }
    }

    Ok((refined, completed))
}

/// One activation of the recursion on caller-owned state: refines `bound`
/// and returns the vertices newly certified final below the refined bound.
/// Frontier members must already carry their final distances.
pub fn bmssp(
    g: &Graph,
    dist: &mut [Weight],
    pred: &mut [Option<Node>],
    level: usize,
    bound: Weight,
    frontier: &[Node],
) -> Result<(Weight, Vec<Node>)> {
    if bound.is_nan() || bound < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "bound {bound} must be non-negative"
        )));
    }
    let n = g.num_vertices();
    if dist.len() != n || pred.len() != n {
        return Err(Error::InvalidArgument(format!(
            "state arrays must have one slot per vertex ({n})"
        )));
    }
    for &s in frontier {
        if s >= n {
            return Err(Error::InvalidIndex(s));
        }
    }
    let (refined, completed) = bmssp_bounded(g, dist, pred, level, DistKey::bound(bound), frontier)?;
    Ok((refined.dist(), completed))
}

/// Initial recursion depth: ceil(log2 n / log2 t), clamped to at least 1.
/// For t = 1 this degenerates to ceil(log2 n), which keeps the top-level
/// completion target k * 2^(level*t) at n or above.
pub fn initial_level(g: &Graph) -> usize {
    let n = g.num_vertices().max(1) as f64;
    let t = g.t();
    let levels = if t > 1 {
        n.log2() / (t as f64).log2()
    } else {
        n.log2()
    };
    (levels.ceil() as usize).max(1)
}

#[derive(Clone, Debug)]
pub struct BmsspResult {
    pub dist: Vec<Weight>,
    pub pred: Vec<Option<Node>>,
    /// Vertices certified final, in first-completion order.
    pub completed: Vec<Node>,
    /// Refined bound B' <= B.
    pub bound: Weight,
}

/// Driver: seed the sources at distance zero and run one full-depth BMSSP.
pub fn bounded_multi_source_shortest_paths(
    g: &Graph,
    sources: &[Node],
    bound: Weight,
) -> Result<BmsspResult> {
    if bound.is_nan() || bound < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "bound {bound} must be non-negative"
        )));
    }
    let n = g.num_vertices();
    let mut dist = vec![Weight::INFINITY; n];
    let mut pred: Vec<Option<Node>> = vec![None; n];

    let mut seeds: Vec<Node> = Vec::with_capacity(sources.len());
    let mut seen: HashSet<Node> = HashSet::with_capacity(sources.len());
    for &s in sources {
        if s >= n {
            return Err(Error::InvalidIndex(s));
        }
        if seen.insert(s) {
            seeds.push(s);
            dist[s] = 0.0;
        }
    }

    let level = initial_level(g);
    let (refined, completed) =
        bmssp_bounded(g, &mut dist, &mut pred, level, DistKey::bound(bound), &seeds)?;

    Ok(BmsspResult {
        dist,
        pred,
        completed,
        bound: refined.dist(),
    })
}
