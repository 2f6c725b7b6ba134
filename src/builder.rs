use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

use crate::config::{BuildConfig, VantageSelection};
use crate::error::Result;
use crate::median::lower_median_by;
use crate::vptree::{checked, MetricSpace, Node};

/// Subsets at most this large are built on the current thread by the
/// parallel builder.
const PARALLEL_CUTOFF: usize = 1024;

/// A vantage point together with the partition of the rest of its subset.
struct Split<F> {
    vantage: usize,
    threshold: F,
    near: Vec<usize>,
    far: Vec<usize>,
}

fn internal<F>(vantage: usize, threshold: F, near: Node<F>, far: Node<F>) -> Node<F> {
    Node::Internal {
        vantage,
        threshold,
        near: Box::new(near),
        far: Box::new(far),
    }
}

/// Each child gets its own seed, drawn from the parent's generator, so the
/// shape of a subtree never depends on the order subtrees are built in.
fn child_seeds<R: Rng + ?Sized>(rng: &mut R) -> (u64, u64) {
    let near = rng.gen();
    let far = rng.gen();
    (near, far)
}

enum Task<F> {
    Build { indices: Vec<usize>, seed: u64 },
    /// Pop the far then the near subtree off the output stack.
    Assemble { vantage: usize, threshold: F },
}

pub(crate) struct TreeBuilder<'a, T: MetricSpace> {
    items: &'a [T],
    context: &'a T::Context,
    leaf_size: usize,
    vantage: VantageSelection,
}

impl<'a, T: MetricSpace> TreeBuilder<'a, T> {
    pub fn new(items: &'a [T], context: &'a T::Context, config: &BuildConfig) -> Self {
        TreeBuilder {
            items,
            context,
            leaf_size: config.leaf_size,
            vantage: config.vantage,
        }
    }

    /// Pick a vantage point from `indices` and split the rest at the
    /// median distance from it. Ties with the median go near.
    fn split<R: Rng + ?Sized>(
        &self,
        mut indices: Vec<usize>,
        rng: &mut R,
    ) -> Result<Split<T::Distance>> {
        let pos = match self.vantage {
            VantageSelection::Randomized => rng.gen_range(0..indices.len()),
            VantageSelection::First => 0,
        };
        let vantage = indices.remove(pos);
        let vp = &self.items[vantage];

        let distances = indices
            .iter()
            .map(|&i| checked(vp.distance(&self.items[i], self.context), i))
            .collect::<Result<Vec<_>>>()?;

        // Select on a scratch copy so both halves keep the parent's order.
        let mut scratch = distances.clone();
        let cmp = |a: &T::Distance, b: &T::Distance| a.partial_cmp(b).unwrap_or(Ordering::Equal);
        let m = lower_median_by(&mut scratch, rng, &cmp);
        let threshold = scratch[m];

        let (near, far): (Vec<_>, Vec<_>) = indices
            .into_iter()
            .zip(distances)
            .partition(|&(_, d)| d <= threshold);

        Ok(Split {
            vantage,
            threshold,
            near: near.into_iter().map(|(i, _)| i).collect(),
            far: far.into_iter().map(|(i, _)| i).collect(),
        })
    }

    /// Build the subtree over `indices`, depth first with the near side
    /// first.
    ///
    /// Runs off an explicit task stack: a subset of identical items only
    /// shrinks by one item per level, so the tree can be as deep as the
    /// subset is large.
    pub fn node(&self, indices: Vec<usize>, seed: u64) -> Result<Node<T::Distance>> {
        let mut tasks = vec![Task::Build { indices, seed }];
        let mut built: Vec<Node<T::Distance>> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Build { indices, seed } => {
                    if indices.len() <= self.leaf_size {
                        built.push(Node::Leaf { indices });
                        continue;
                    }
                    let mut rng = StdRng::seed_from_u64(seed);
                    let Split { vantage, threshold, near, far } = self.split(indices, &mut rng)?;
                    let (near_seed, far_seed) = child_seeds(&mut rng);
                    tasks.push(Task::Assemble { vantage, threshold });
                    tasks.push(Task::Build { indices: far, seed: far_seed });
                    tasks.push(Task::Build { indices: near, seed: near_seed });
                }
                Task::Assemble { vantage, threshold } => {
                    let (Some(far), Some(near)) = (built.pop(), built.pop()) else {
                        unreachable!("both children are built before their parent");
                    };
                    built.push(internal(vantage, threshold, near, far));
                }
            }
        }

        let Some(root) = built.pop() else {
            unreachable!("the root task always yields a node");
        };
        Ok(root)
    }
}

impl<'a, T> TreeBuilder<'a, T>
where
    T: MetricSpace + Sync,
    T::Context: Sync,
{
    /// Same tree as [`node`](Self::node).
    ///
    /// Forks onto rayon only where both children are large. Where one side
    /// is small it is built on this thread and the walk continues down the
    /// large side, so lopsided splits never nest `join` calls.
    pub fn node_parallel(&self, indices: Vec<usize>, seed: u64) -> Result<Node<T::Distance>> {
        // parents still waiting for their large child: (vantage, threshold,
        // built small child, whether the small child is the far one)
        let mut spine = Vec::new();
        let mut indices = indices;
        let mut seed = seed;

        let mut subtree = loop {
            if indices.len() <= self.leaf_size || indices.len() <= PARALLEL_CUTOFF {
                break self.node(indices, seed)?;
            }

            let mut rng = StdRng::seed_from_u64(seed);
            let Split { vantage, threshold, near, far } = self.split(indices, &mut rng)?;
            let (near_seed, far_seed) = child_seeds(&mut rng);

            if near.len() > PARALLEL_CUTOFF && far.len() > PARALLEL_CUTOFF {
                let (near, far) = rayon::join(
                    || self.node_parallel(near, near_seed),
                    || self.node_parallel(far, far_seed),
                );
                break internal(vantage, threshold, near?, far?);
            }

            if near.len() >= far.len() {
                spine.push((vantage, threshold, self.node(far, far_seed)?, true));
                indices = near;
                seed = near_seed;
            } else {
                spine.push((vantage, threshold, self.node(near, near_seed)?, false));
                indices = far;
                seed = far_seed;
            }
        };

        while let Some((vantage, threshold, small, small_is_far)) = spine.pop() {
            subtree = if small_is_far {
                internal(vantage, threshold, subtree, small)
            } else {
                internal(vantage, threshold, small, subtree)
            };
        }
        Ok(subtree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Int(i64);

    impl MetricSpace for Int {
        type Distance = f32;
        type Context = ();
        fn distance(&self, other: &Self, _: &()) -> f32 {
            (self.0 - other.0).abs() as f32
        }
    }

    fn builder<'a>(items: &'a [Int], config: &BuildConfig) -> TreeBuilder<'a, Int> {
        TreeBuilder::new(items, &(), config)
    }

    #[test]
    fn split_uses_lower_median_and_sends_ties_near() {
        // distances from item 0: 1, 1, 2, 3, 3
        let items = [Int(0), Int(1), Int(-1), Int(2), Int(3), Int(-3)];
        let config = BuildConfig::default().vantage(VantageSelection::First);
        let mut rng = StdRng::seed_from_u64(0);
        let split = builder(&items, &config).split((0..6).collect(), &mut rng).unwrap();
        assert_eq!(split.vantage, 0);
        assert_eq!(split.threshold, 2.0);
        assert_eq!(split.near, vec![1, 2, 3]);
        assert_eq!(split.far, vec![4, 5]);
    }

    #[test]
    fn split_with_all_ties_leaves_far_empty() {
        let items = [Int(5), Int(5), Int(5), Int(5)];
        let config = BuildConfig::default();
        let mut rng = StdRng::seed_from_u64(8);
        let split = builder(&items, &config).split((0..4).collect(), &mut rng).unwrap();
        assert_eq!(split.threshold, 0.0);
        assert_eq!(split.near.len(), 3);
        assert!(split.far.is_empty());
    }

    #[test]
    fn randomized_vantage_depends_on_seed() {
        let items: Vec<Int> = (0..64).map(Int).collect();
        let config = BuildConfig::default();
        let vantages: Vec<usize> = (0..16)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                builder(&items, &config).split((0..64).collect(), &mut rng).unwrap().vantage
            })
            .collect();
        assert!(vantages.iter().any(|&v| v != vantages[0]));
    }

    #[test]
    fn equal_items_form_a_near_chain() {
        let items: Vec<Int> = (0..3000).map(|_| Int(5)).collect();
        let config = BuildConfig::default();
        let b = builder(&items, &config);
        for parallel in [false, true] {
            let root = if parallel {
                b.node_parallel((0..3000).collect(), 4).unwrap()
            } else {
                b.node((0..3000).collect(), 4).unwrap()
            };
            let mut node = &root;
            let mut levels = 0;
            while let Node::Internal { ref near, ref far, .. } = *node {
                match **far {
                    Node::Leaf { ref indices } => assert!(indices.is_empty()),
                    _ => panic!("far side of a tie should be empty"),
                }
                levels += 1;
                node = &**near;
            }
            assert_eq!(levels, 2999);
        }
    }
}
