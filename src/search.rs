use crate::error::Result;
use crate::results::BestCandidate;
use crate::vptree::{checked, MetricSpace, Node};

/// How much of the tree a single query touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_visited: usize,
    pub distance_evaluations: usize,
}

/// Per-query traversal state. Owns nothing shared, so any number of
/// searches can run against one tree at once.
pub(crate) struct Search<'s, T: MetricSpace> {
    items: &'s [T],
    context: &'s T::Context,
    needle: &'s T,
    stats: SearchStats,
}

impl<'s, T: MetricSpace> Search<'s, T> {
    pub fn new(items: &'s [T], context: &'s T::Context, needle: &'s T) -> Self {
        Search {
            items,
            context,
            needle,
            stats: SearchStats::default(),
        }
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn measure(&mut self, index: usize) -> Result<T::Distance> {
        self.stats.distance_evaluations += 1;
        checked(self.items[index].distance(self.needle, self.context), index)
    }

    /// Branch-and-bound descent.
    ///
    /// Visits the side of the split the needle falls in first, then the
    /// other side only if the triangle inequality leaves room for an item
    /// there within the candidate's current radius `tau`:
    /// near needs `d - tau <= threshold`, far needs `d + tau >= threshold`.
    ///
    /// The second side is pushed with its `d` and threshold and tested
    /// when it is popped, against `tau` as it stands after the first side
    /// was searched.
    pub fn visit<'n, C>(&mut self, root: &'n Node<T::Distance>, candidate: &mut C) -> Result<()>
    where
        C: BestCandidate<T::Distance>,
    {
        let mut pending = vec![Step::Visit(root)];

        while let Some(step) = pending.pop() {
            let node = match step {
                Step::Visit(node) => node,
                Step::Deferred { node, side, d, threshold } => {
                    let tau = candidate.distance();
                    let reachable = match side {
                        Side::Near => d - tau <= threshold,
                        Side::Far => d + tau >= threshold,
                    };
                    if !reachable {
                        continue;
                    }
                    node
                }
            };

            self.stats.nodes_visited += 1;
            match *node {
                Node::Leaf { ref indices } => {
                    for &index in indices {
                        let d = self.measure(index)?;
                        candidate.consider(index, d);
                    }
                }
                Node::Internal { vantage, threshold, ref near, ref far } => {
                    let d = self.measure(vantage)?;
                    candidate.consider(vantage, d);

                    if d <= threshold {
                        pending.push(Step::Deferred {
                            node: &**far,
                            side: Side::Far,
                            d,
                            threshold,
                        });
                        pending.push(Step::Visit(&**near));
                    } else {
                        pending.push(Step::Deferred {
                            node: &**near,
                            side: Side::Near,
                            d,
                            threshold,
                        });
                        pending.push(Step::Visit(&**far));
                    }
                }
            }
        }
        Ok(())
    }
}

enum Side {
    Near,
    Far,
}

enum Step<'n, F> {
    Visit(&'n Node<F>),
    /// The side visited second, still subject to the pruning test.
    Deferred {
        node: &'n Node<F>,
        side: Side,
        d: F,
        threshold: F,
    },
}
