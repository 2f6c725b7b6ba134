//! Candidate collectors driven by the tree traversal.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::vptree::Scalar;

/// Receives every `(index, distance)` pair the search evaluates and
/// bounds how far the search has to look.
///
/// [`distance`](BestCandidate::distance) is the pruning radius: any
/// subtree provably farther than it from the needle is skipped. It may
/// only shrink over the course of one search.
pub trait BestCandidate<F: Scalar> {
    type Output;

    fn consider(&mut self, index: usize, distance: F);

    fn distance(&self) -> F;

    fn result(self) -> Self::Output;
}

struct HeapElem<F> {
    dist: F,
    index: usize,
}

// Ordered by distance, then index. Distances are checked for NaN before
// they get here.
impl<F: Scalar> Ord for HeapElem<F> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl<F: Scalar> PartialOrd for HeapElem<F> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F: Scalar> PartialEq for HeapElem<F> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F: Scalar> Eq for HeapElem<F> {}

/// The `k` best `(index, distance)` pairs seen so far.
///
/// A pair beats another when it is closer, or equally close with a
/// smaller index, so the kept set does not depend on the order pairs
/// arrive in.
pub struct ResultSet<F> {
    k: usize,
    heap: BinaryHeap<HeapElem<F>>,
}

/// Room reserved up front; a larger `k` grows the heap as pairs arrive.
const PREALLOCATE_MAX: usize = 4096;

impl<F: Scalar> ResultSet<F> {
    pub fn new(k: usize) -> Self {
        ResultSet {
            k,
            heap: BinaryHeap::with_capacity(k.min(PREALLOCATE_MAX)),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Distance of the worst kept pair once `k` pairs are held, +inf
    /// before that.
    pub fn tau(&self) -> F {
        if self.heap.len() < self.k {
            return F::infinity();
        }
        self.heap.peek().map_or(F::neg_infinity(), |worst| worst.dist)
    }

    /// Insert the pair if it belongs among the best `k`, evicting the
    /// current worst. Returns whether it was kept.
    pub fn insert(&mut self, index: usize, dist: F) -> bool {
        let elem = HeapElem { dist, index };
        if self.heap.len() < self.k {
            self.heap.push(elem);
            return true;
        }
        match self.heap.peek() {
            Some(worst) if elem < *worst => {
                self.heap.pop();
                self.heap.push(elem);
                true
            }
            _ => false,
        }
    }

    /// The kept pairs, ascending by distance then index.
    pub fn into_sorted_vec(self) -> Vec<(usize, F)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| (e.index, e.dist))
            .collect()
    }
}

impl<F: Scalar> BestCandidate<F> for ResultSet<F> {
    type Output = Vec<(usize, F)>;

    #[inline]
    fn consider(&mut self, index: usize, distance: F) {
        self.insert(index, distance);
    }

    #[inline]
    fn distance(&self) -> F {
        self.tau()
    }

    fn result(self) -> Self::Output {
        self.into_sorted_vec()
    }
}

/// Every pair within a fixed radius (inclusive).
pub struct WithinRadius<F> {
    radius: F,
    found: Vec<(usize, F)>,
}

impl<F: Scalar> WithinRadius<F> {
    pub fn new(radius: F) -> Self {
        WithinRadius {
            radius,
            found: Vec::new(),
        }
    }
}

impl<F: Scalar> BestCandidate<F> for WithinRadius<F> {
    type Output = Vec<(usize, F)>;

    #[inline]
    fn consider(&mut self, index: usize, distance: F) {
        if distance <= self.radius {
            self.found.push((index, distance));
        }
    }

    #[inline]
    fn distance(&self) -> F {
        self.radius
    }

    fn result(mut self) -> Self::Output {
        self.found.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        self.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tau_is_infinite_until_full() {
        let mut set = ResultSet::new(2);
        assert_eq!(set.tau(), f32::INFINITY);
        set.insert(0, 3.0f32);
        assert_eq!(set.tau(), f32::INFINITY);
        set.insert(1, 1.0);
        assert_eq!(set.tau(), 3.0);
        set.insert(2, 2.0);
        assert_eq!(set.tau(), 2.0);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn bounded_insert_keeps_closest() {
        let mut set = ResultSet::new(2);
        assert!(set.insert(0, 5.0f64));
        assert!(set.insert(1, 1.0));
        assert!(set.insert(2, 3.0));
        assert!(!set.insert(3, 4.0));
        assert_eq!(set.into_sorted_vec(), vec![(1, 1.0), (2, 3.0)]);
    }

    #[test]
    fn ties_prefer_smaller_index_regardless_of_arrival() {
        let mut forward = ResultSet::new(2);
        let mut backward = ResultSet::new(2);
        for i in 0..5 {
            forward.insert(i, 1.0f64);
            backward.insert(4 - i, 1.0f64);
        }
        assert_eq!(forward.into_sorted_vec(), vec![(0, 1.0), (1, 1.0)]);
        assert_eq!(backward.into_sorted_vec(), vec![(0, 1.0), (1, 1.0)]);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut set = ResultSet::new(0);
        assert!(!set.insert(0, 0.0f64));
        assert!(set.is_empty());
        assert_eq!(set.tau(), f64::NEG_INFINITY);
    }

    #[test]
    fn unbounded_k_does_not_reserve_k_slots() {
        for k in [usize::MAX, usize::MAX / 2] {
            let mut set = ResultSet::new(k);
            assert_eq!(set.tau(), f64::INFINITY);
            for i in 0..10 {
                assert!(set.insert(i, (10 - i) as f64));
            }
            assert_eq!(set.len(), 10);
            assert_eq!(set.tau(), f64::INFINITY);
            assert_eq!(set.into_sorted_vec()[0], (9, 1.0));
        }
    }

    #[test]
    fn within_radius_is_inclusive_and_sorted() {
        let mut within = WithinRadius::new(2.0f64);
        within.consider(4, 2.0);
        within.consider(1, 2.5);
        within.consider(3, 0.5);
        within.consider(0, 2.0);
        assert_eq!(within.distance(), 2.0);
        assert_eq!(within.result(), vec![(3, 0.5), (0, 2.0), (4, 2.0)]);
    }
}
