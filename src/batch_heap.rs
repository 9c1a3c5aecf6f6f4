//! Batch-pull priority structure: an ordered block list standing in for a
//! comparison heap.
//!
//! Two layers of blocks hold (vertex, key) pairs. D0 is a front list of
//! prepend blocks carrying values below everything inserted so far; D1 is a
//! bound-ordered list of insert blocks, each tagged with an upper bound on
//! its contents, the bounds strictly increasing and the last one being the
//! structure bound B. A handle table maps every stored vertex to its block
//! and slot so deletion is O(1) via swap-remove.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::{DistKey, Node};

#[derive(Clone, Copy, Debug)]
struct Entry {
    vertex: Node,
    value: DistKey,
}

#[derive(Debug)]
struct Block {
    bound: DistKey,
    items: Vec<Entry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layer {
    Prepend,
    Insert,
}

#[derive(Clone, Copy, Debug)]
struct Loc {
    layer: Layer,
    block: usize,
    slot: usize,
    value: DistKey,
}

/// Deletable best-at-front structure over at most one entry per vertex, all
/// values strictly below the bound handed to `new`.
#[derive(Debug)]
pub struct BatchHeap {
    batch: usize,
    bound: DistKey,
    blocks: Vec<Block>,
    d0: VecDeque<usize>,
    d1: BTreeSet<(DistKey, usize)>,
    locs: HashMap<Node, Loc>,
    len: usize,
    /// The D1 block bounded by B itself; it survives emptying so an insert
    /// below the bound always finds a home.
    sentinel: usize,
}

impl BatchHeap {
    pub fn new(batch: usize, bound: DistKey) -> Self {
        let batch = batch.max(1);
        let blocks = vec![Block {
            bound,
            items: Vec::new(),
        }];
        let mut d1 = BTreeSet::new();
        d1.insert((bound, 0));
        Self {
            batch,
            bound,
            blocks,
            d0: VecDeque::new(),
            d1,
            locs: HashMap::new(),
            len: 0,
            sentinel: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert or decrease; values at or beyond the bound are ignored and an
    /// existing better-or-equal entry for the vertex wins.
    pub fn insert(&mut self, vertex: Node, value: DistKey) {
        if value >= self.bound {
            return;
        }
        if let Some(&loc) = self.locs.get(&vertex) {
            if value >= loc.value {
                return;
            }
            self.remove(vertex, loc);
        }

        let Some(&(_, id)) = self.d1.range((value, 0)..).next() else {
            debug_assert!(false, "sentinel block admits every value below the bound");
            return;
        };
        let slot = self.blocks[id].items.len();
        self.blocks[id].items.push(Entry { vertex, value });
        self.locs.insert(
            vertex,
            Loc {
                layer: Layer::Insert,
                block: id,
                slot,
                value,
            },
        );
        self.len += 1;

        if self.blocks[id].items.len() > self.batch {
            self.split(id);
        }
    }

    /// Split an overfull D1 block at its median value. The lower half keeps
    /// the block id under a tight bound (its own maximum, strictly below the
    /// upper half since keys are distinct); the upper half moves to a fresh
    /// block under the old bound.
    fn split(&mut self, id: usize) {
        let old_bound = self.blocks[id].bound;
        self.d1.remove(&(old_bound, id));

        let mut items = std::mem::take(&mut self.blocks[id].items);
        let mid = items.len() / 2;
        items.select_nth_unstable_by_key(mid, |e| e.value);
        let upper_items = items.split_off(mid);
        let mut lower_bound = items[0].value;
        for e in &items[1..] {
            if e.value > lower_bound {
                lower_bound = e.value;
            }
        }

        let upper_id = self.blocks.len();
        self.blocks.push(Block {
            bound: old_bound,
            items: upper_items,
        });
        self.blocks[id].bound = lower_bound;
        self.blocks[id].items = items;
        if id == self.sentinel {
            self.sentinel = upper_id;
        }

        self.d1.insert((lower_bound, id));
        self.d1.insert((old_bound, upper_id));
        self.relabel(id, Layer::Insert);
        self.relabel(upper_id, Layer::Insert);
    }

    /// Prepend a batch whose values sit strictly below everything currently
    /// in D1 (the caller's contract, checked in debug builds). Duplicate
    /// vertices, within the batch or against stored entries, resolve to the
    /// smaller value so the one-entry-per-vertex invariant holds.
    pub fn batch_prepend(&mut self, items: Vec<(Node, DistKey)>) {
        debug_assert!(
            {
                let d1_min = self
                    .d1
                    .iter()
                    .flat_map(|&(_, id)| self.blocks[id].items.iter())
                    .map(|e| e.value)
                    .min();
                items
                    .iter()
                    .all(|&(_, v)| d1_min.is_none_or(|m| v < m))
            },
            "prepended values must sit strictly below D1"
        );

        let mut best: std::collections::BTreeMap<Node, DistKey> = std::collections::BTreeMap::new();
        for (vertex, value) in items {
            if value >= self.bound {
                continue;
            }
            best.entry(vertex)
                .and_modify(|cur| {
                    if value < *cur {
                        *cur = value;
                    }
                })
                .or_insert(value);
        }

        let mut accepted: Vec<Entry> = Vec::with_capacity(best.len());
        for (vertex, value) in best {
            if let Some(&loc) = self.locs.get(&vertex) {
                if value >= loc.value {
                    continue;
                }
                self.remove(vertex, loc);
            }
            accepted.push(Entry { vertex, value });
        }
        if accepted.is_empty() {
            return;
        }

        if accepted.len() <= self.batch {
            self.push_front_block(accepted);
            return;
        }

        // Median partition into fragments of at most ceil(M/2); fragments are
        // produced in value order and pushed back-to-front so the smallest
        // ones end up earliest in D0.
        let cap = self.batch.div_ceil(2);
        let mut segments: Vec<(usize, usize)> = Vec::new();
        partition_by_medians(&mut accepted, cap, &mut segments);
        for &(lo, hi) in segments.iter().rev() {
            self.push_front_block(accepted[lo..hi].to_vec());
        }
    }

    fn push_front_block(&mut self, items: Vec<Entry>) {
        let id = self.blocks.len();
        self.len += items.len();
        self.blocks.push(Block {
            bound: self.bound,
            items,
        });
        self.d0.push_front(id);
        self.relabel(id, Layer::Prepend);
    }

    /// Remove up to `batch` smallest entries. Returns their vertices and the
    /// smallest value still stored (the bound itself once nothing remains).
    pub fn pull(&mut self) -> (DistKey, Vec<Node>) {
        if self.len == 0 {
            return (self.bound, Vec::new());
        }
        self.trim_d0();

        // Whole-block prefixes from each layer until either side alone could
        // cover the batch.
        let mut candidates: Vec<Entry> = Vec::new();
        let mut got = 0;
        for &id in &self.d0 {
            if got >= self.batch {
                break;
            }
            let items = &self.blocks[id].items;
            if items.is_empty() {
                continue;
            }
            candidates.extend_from_slice(items);
            got += items.len();
        }
        got = 0;
        for &(_, id) in &self.d1 {
            if got >= self.batch {
                break;
            }
            let items = &self.blocks[id].items;
            if items.is_empty() {
                continue;
            }
            candidates.extend_from_slice(items);
            got += items.len();
        }

        if candidates.len() > self.batch {
            candidates.select_nth_unstable_by_key(self.batch, |e| e.value);
            candidates.truncate(self.batch);
        }

        let keys: Vec<Node> = candidates.iter().map(|e| e.vertex).collect();
        for e in &candidates {
            if let Some(&loc) = self.locs.get(&e.vertex) {
                self.remove(e.vertex, loc);
            }
        }

        let x = if self.len == 0 {
            self.bound
        } else {
            self.min_value().min(self.bound)
        };
        (x, keys)
    }

    fn remove(&mut self, vertex: Node, loc: Loc) {
        self.locs.remove(&vertex);
        self.len -= 1;

        let moved = {
            let block = &mut self.blocks[loc.block];
            block.items.swap_remove(loc.slot);
            block.items.get(loc.slot).copied()
        };
        if let Some(m) = moved {
            if let Some(l) = self.locs.get_mut(&m.vertex) {
                l.slot = loc.slot;
            }
        }

        if loc.layer == Layer::Insert
            && loc.block != self.sentinel
            && self.blocks[loc.block].items.is_empty()
        {
            let bound = self.blocks[loc.block].bound;
            self.d1.remove(&(bound, loc.block));
        }
    }

    fn trim_d0(&mut self) {
        while let Some(&id) = self.d0.front() {
            if !self.blocks[id].items.is_empty() {
                break;
            }
            self.d0.pop_front();
        }
    }

    /// Smallest stored value. D0 needs a full scan (prepend batches are only
    /// ordered relative to D1); in D1 the first non-empty block holds the
    /// layer minimum because block contents partition the value range.
    fn min_value(&self) -> DistKey {
        let mut best: Option<DistKey> = None;
        for &id in &self.d0 {
            for e in &self.blocks[id].items {
                if best.is_none_or(|b| e.value < b) {
                    best = Some(e.value);
                }
            }
        }
        for &(_, id) in &self.d1 {
            let items = &self.blocks[id].items;
            if items.is_empty() {
                continue;
            }
            for e in items {
                if best.is_none_or(|b| e.value < b) {
                    best = Some(e.value);
                }
            }
            break;
        }
        best.unwrap_or(self.bound)
    }

    fn relabel(&mut self, id: usize, layer: Layer) {
        for slot in 0..self.blocks[id].items.len() {
            let e = self.blocks[id].items[slot];
            self.locs.insert(
                e.vertex,
                Loc {
                    layer,
                    block: id,
                    slot,
                    value: e.value,
                },
            );
        }
    }
}

/// In-order list of (lo, hi) fragments no longer than `cap`, produced by
/// repeated median partition. After the call, values within [lo, hi) are all
/// less-or-equal than values of any later fragment.
fn partition_by_medians(values: &mut [Entry], cap: usize, out: &mut Vec<(usize, usize)>) {
    out.clear();
    let mut stack: Vec<(usize, usize)> = vec![(0, values.len())];
    while let Some((lo, hi)) = stack.pop() {
        let len = hi - lo;
        if len <= cap {
            out.push((lo, hi));
            continue;
        }
        let mid = lo + len / 2;
        values[lo..hi].select_nth_unstable_by_key(mid - lo, |e| e.value);
        stack.push((mid, hi));
        stack.push((lo, mid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn key(d: f64, v: Node) -> DistKey {
        DistKey::new(d, v)
    }

    impl BatchHeap {
        /// Structural invariants: one entry per vertex, block capacity,
        /// strictly increasing D1 bounds covering their contents, every
        /// value below the structure bound.
        fn check_invariants(&self) {
            let mut seen = std::collections::HashSet::new();
            let mut total = 0;
            for block in &self.blocks {
                for e in &block.items {
                    assert!(e.value < self.bound);
                }
            }
            for &id in &self.d0 {
                for e in &self.blocks[id].items {
                    assert!(seen.insert(e.vertex), "vertex {} stored twice", e.vertex);
                    total += 1;
                }
            }
            let mut prev: Option<DistKey> = None;
            for &(bound, id) in &self.d1 {
                assert_eq!(self.blocks[id].bound, bound);
                assert!(self.blocks[id].items.len() <= self.batch);
                if let Some(p) = prev {
                    assert!(bound > p, "D1 bounds not strictly increasing");
                }
                prev = Some(bound);
                for e in &self.blocks[id].items {
                    assert!(e.value <= bound);
                    assert!(seen.insert(e.vertex), "vertex {} stored twice", e.vertex);
                    total += 1;
                }
            }
            assert_eq!(total, self.len);
            assert_eq!(self.locs.len(), self.len);
        }
    }

    #[test]
    fn insert_keeps_the_smaller_value() {
        let mut d = BatchHeap::new(4, DistKey::bound(f64::INFINITY));
        d.insert(3, key(10.0, 3));
        d.insert(3, key(9.0, 3));
        d.insert(3, key(11.0, 3)); // ignored
        d.check_invariants();
        let (x, keys) = d.pull();
        assert_eq!(keys, vec![3]);
        assert_eq!(x, DistKey::bound(f64::INFINITY));
        assert!(d.is_empty());
    }

    #[test]
    fn insert_ignores_values_at_or_beyond_bound() {
        let mut d = BatchHeap::new(4, DistKey::bound(5.0));
        d.insert(1, key(5.0, 1));
        d.insert(2, key(7.0, 2));
        assert!(d.is_empty());
        d.insert(3, key(4.5, 3));
        assert_eq!(d.len(), 1);
        d.check_invariants();
    }

    #[test]
    fn pull_reports_the_next_remaining_value() {
        let mut d = BatchHeap::new(2, DistKey::bound(f64::INFINITY));
        d.insert(10, key(10.0, 10));
        d.insert(11, key(11.0, 11));
        d.insert(12, key(12.0, 12));
        d.check_invariants();
        let (x, keys) = d.pull();
        assert_eq!(keys.len(), 2);
        assert_eq!(x, key(12.0, 12));
        let (x2, keys2) = d.pull();
        assert_eq!(keys2, vec![12]);
        assert_eq!(x2, DistKey::bound(f64::INFINITY));
    }

    #[test]
    fn pull_on_empty_returns_bound_and_no_keys() {
        let mut d = BatchHeap::new(3, DistKey::bound(9.0));
        let (x, keys) = d.pull();
        assert!(keys.is_empty());
        assert_eq!(x, DistKey::bound(9.0));
    }

    #[test]
    fn splits_keep_blocks_within_capacity() {
        let mut d = BatchHeap::new(3, DistKey::bound(f64::INFINITY));
        for v in 0..50 {
            d.insert(v, key(v as f64 * 1.5, v));
            d.check_invariants();
        }
        assert_eq!(d.len(), 50);
    }

    #[test]
    fn batch_prepend_fragments_in_value_order() {
        let mut d = BatchHeap::new(4, DistKey::bound(f64::INFINITY));
        for v in 0..4 {
            d.insert(v, key(100.0 + v as f64, v));
        }
        let batch: Vec<(Node, DistKey)> = (10..30).map(|v| (v, key(v as f64, v))).collect();
        d.batch_prepend(batch);
        d.check_invariants();
        // The twenty prepended values come out before any inserted one.
        let mut out = Vec::new();
        loop {
            let (_, keys) = d.pull();
            if keys.is_empty() {
                break;
            }
            out.extend(keys);
        }
        assert_eq!(out.len(), 24);
        assert!(out[..20].iter().all(|&v| v >= 10));
        assert!(out[20..].iter().all(|&v| v < 4));
    }

    #[test]
    fn batch_prepend_resolves_duplicates_to_the_smaller_value() {
        let mut d = BatchHeap::new(4, DistKey::bound(f64::INFINITY));
        d.insert(7, key(50.0, 7));
        d.batch_prepend(vec![(7, key(20.0, 7)), (7, key(30.0, 7)), (8, key(25.0, 8))]);
        d.check_invariants();
        assert_eq!(d.len(), 2);
        let (_, keys) = d.pull();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&7) && keys.contains(&8));
    }

    #[test]
    fn randomized_ops_agree_with_reference_model() {
        let bound = DistKey::bound(5000.0);
        let m = 8;
        let mut d = BatchHeap::new(m, bound);
        let mut model: BTreeMap<Node, DistKey> = BTreeMap::new();
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);

        for _ in 0..4000 {
            match rng.gen_range(0..3) {
                0 => {
                    let v = rng.gen_range(0..256usize);
                    let val = key(rng.gen_range(0..4000) as f64, v);
                    d.insert(v, val);
                    model
                        .entry(v)
                        .and_modify(|cur| *cur = (*cur).min(val))
                        .or_insert(val);
                }
                1 => {
                    // Respect the prepend contract: values strictly below the
                    // current minimum (or anything when the model is empty).
                    let floor = model.values().min().map_or(4000.0, |k| k.dist());
                    if floor < 1.0 {
                        continue;
                    }
                    let count = rng.gen_range(1..=12);
                    let mut batch = Vec::new();
                    for _ in 0..count {
                        let v = rng.gen_range(0..256usize);
                        let val = key(rng.gen_range(0.0..floor), v);
                        batch.push((v, val));
                    }
                    for &(v, val) in &batch {
                        model
                            .entry(v)
                            .and_modify(|cur| *cur = (*cur).min(val))
                            .or_insert(val);
                    }
                    d.batch_prepend(batch);
                }
                _ => {
                    let (x, keys) = d.pull();
                    if model.is_empty() {
                        assert!(keys.is_empty());
                        assert_eq!(x, bound);
                        continue;
                    }
                    let take = m.min(model.len());
                    let mut expect: Vec<(DistKey, Node)> =
                        model.iter().map(|(&v, &val)| (val, v)).collect();
                    expect.sort();
                    let expected: std::collections::BTreeSet<Node> =
                        expect.iter().take(take).map(|&(_, v)| v).collect();
                    for &v in &expected {
                        model.remove(&v);
                    }
                    let got: std::collections::BTreeSet<Node> = keys.into_iter().collect();
                    assert_eq!(got, expected);
                    let expected_x = model.values().min().copied().unwrap_or(bound);
                    assert_eq!(x, expected_x);
                }
            }
            d.check_invariants();
        }
    }
}
