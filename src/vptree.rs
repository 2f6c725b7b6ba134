//! Vantage-Point Trees are a data structure for fast
//! k-nearest-neighbor searches in any metric space.
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::{self, Debug, Display};
use std::mem;
use std::time::Instant;

pub use num::Float;

use crate::builder::TreeBuilder;
use crate::config::BuildConfig;
use crate::error::{Result, VPTreeError};
use crate::results::{BestCandidate, ResultSet, WithinRadius};
use crate::search::{Search, SearchStats};

pub trait Scalar: Float + Debug + Display + Send + Sync {}
impl<T: Float + Debug + Display + Send + Sync> Scalar for T {}

/// An item that can be indexed by a [`VPTree`].
///
/// `distance` must be a true metric: non-negative, symmetric, and
/// respecting the triangle inequality. A squared euclidean distance is
/// *not* a metric; take the square root.
pub trait MetricSpace {
    type Distance: Scalar;

    /// Immutable auxiliary data handed to every distance computation,
    /// e.g. normalization constants. Use `()` when none is needed.
    type Context;

    fn distance(&self, other: &Self, context: &Self::Context) -> Self::Distance;
}

/// Reject NaN, negative, and infinite distances coming out of the metric.
pub(crate) fn checked<F: Scalar>(distance: F, item: usize) -> Result<F> {
    if distance.is_nan() || distance.is_infinite() || distance < F::zero() {
        return Err(VPTreeError::InvalidDistance {
            item,
            distance: distance.to_f64().unwrap_or(f64::NAN),
        });
    }
    Ok(distance)
}

pub(crate) enum Node<F> {
    Leaf {
        indices: Vec<usize>,
    },
    Internal {
        vantage: usize,
        /// Items of `near` are at most this far from the vantage point,
        /// items of `far` strictly farther.
        threshold: F,
        near: Box<Node<F>>,
        far: Box<Node<F>>,
    },
}

impl<F> Node<F> {
    /// `(node count, depth)`, walked without recursion: a run of
    /// duplicate items makes a chain as long as the run.
    fn shape(&self) -> (usize, usize) {
        let mut count = 0;
        let mut depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            count += 1;
            depth = depth.max(level);
            if let Node::Internal { ref near, ref far, .. } = *node {
                stack.push((&**far, level + 1));
                stack.push((&**near, level + 1));
            }
        }
        (count, depth)
    }

    /// Move internal children out into `pending`, leaving empty leaves
    /// behind, so dropping this node never recurses more than one level.
    fn detach_children(&mut self, pending: &mut Vec<Node<F>>) {
        if let Node::Internal { ref mut near, ref mut far, .. } = *self {
            for child in [near, far] {
                if let Node::Internal { .. } = **child {
                    pending.push(mem::replace(&mut **child, Node::Leaf { indices: Vec::new() }));
                }
            }
        }
    }
}

impl<F> Drop for Node<F> {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

/// An immutable vantage point tree over a borrowed slice of items.
///
/// Queries return indices into that slice.
pub struct VPTree<'a, T: MetricSpace> {
    items: &'a [T],
    context: &'a T::Context,
    root: Node<T::Distance>,
    node_count: usize,
    depth: usize,
}

fn seeded(config: &BuildConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl<'a, T> VPTree<'a, T>
where
    T: MetricSpace<Context = ()>,
{
    /// Construct a tree with the default configuration, for items
    /// whose metric needs no context.
    pub fn new(items: &'a [T]) -> Result<Self> {
        Self::build(items, &(), BuildConfig::default())
    }
}

impl<'a, T: MetricSpace> VPTree<'a, T> {
    /// Construct a tree with the default configuration.
    pub fn with_context(items: &'a [T], context: &'a T::Context) -> Result<Self> {
        Self::build(items, context, BuildConfig::default())
    }

    /// Construct a tree, seeding the vantage selection from
    /// `config.seed`, or from OS entropy if there is none.
    pub fn build(items: &'a [T], context: &'a T::Context, config: BuildConfig) -> Result<Self> {
        let mut rng = seeded(&config);
        Self::build_with_rng(items, context, config, &mut rng)
    }

    /// Construct a tree drawing all randomness from `rng`.
    pub fn build_with_rng<R: Rng + ?Sized>(
        items: &'a [T],
        context: &'a T::Context,
        config: BuildConfig,
        rng: &mut R,
    ) -> Result<Self> {
        Self::assemble(items, context, &config, rng, "serial", |builder, indices, seed| {
            builder.node(indices, seed)
        })
    }

    fn assemble<R, B>(
        items: &'a [T],
        context: &'a T::Context,
        config: &BuildConfig,
        rng: &mut R,
        mode: &str,
        build_root: B,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
        B: FnOnce(&TreeBuilder<'a, T>, Vec<usize>, u64) -> Result<Node<T::Distance>>,
    {
        config.validate()?;
        if items.is_empty() {
            return Err(VPTreeError::EmptyInput);
        }

        let start = Instant::now();
        let builder = TreeBuilder::new(items, context, config);
        let root = build_root(&builder, (0..items.len()).collect(), rng.gen())?;
        let (node_count, depth) = root.shape();

        let tree = VPTree {
            items,
            context,
            root,
            node_count,
            depth,
        };
        debug!(
            "built vantage point tree ({}): {} items, {} nodes, depth {}, in {:?}",
            mode,
            tree.len(),
            tree.node_count,
            tree.depth,
            start.elapsed()
        );
        Ok(tree)
    }
}

impl<'a, T> VPTree<'a, T>
where
    T: MetricSpace + Sync,
    T::Context: Sync,
{
    /// Like [`build`](Self::build), building large subtrees on the rayon
    /// thread pool. Gives the same tree as `build` for the same seed.
    pub fn build_parallel(
        items: &'a [T],
        context: &'a T::Context,
        config: BuildConfig,
    ) -> Result<Self> {
        let mut rng = seeded(&config);
        Self::build_parallel_with_rng(items, context, config, &mut rng)
    }

    /// Like [`build_with_rng`](Self::build_with_rng), building large
    /// subtrees on the rayon thread pool.
    pub fn build_parallel_with_rng<R: Rng + ?Sized>(
        items: &'a [T],
        context: &'a T::Context,
        config: BuildConfig,
        rng: &mut R,
    ) -> Result<Self> {
        Self::assemble(items, context, &config, rng, "parallel", |builder, indices, seed| {
            builder.node_parallel(indices, seed)
        })
    }
}

impl<'a, T: MetricSpace> VPTree<'a, T> {
    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The indexed items; query results index into this slice.
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Find the nearest item to `needle`, as `(index, distance)`.
    pub fn find_nearest(&self, needle: &T) -> Result<(usize, T::Distance)> {
        let mut found = self.find_nearest_k(needle, 1)?;
        found.pop().ok_or(VPTreeError::EmptyTree)
    }

    /// Find the `k` nearest items to `needle`, ordered by ascending
    /// distance and then ascending index.
    pub fn find_nearest_k(&self, needle: &T, k: usize) -> Result<Vec<(usize, T::Distance)>> {
        self.find_nearest_k_with_stats(needle, k).map(|(found, _)| found)
    }

    /// Like [`find_nearest_k`](Self::find_nearest_k), also reporting
    /// how much of the tree the search had to touch.
    pub fn find_nearest_k_with_stats(
        &self,
        needle: &T,
        k: usize,
    ) -> Result<(Vec<(usize, T::Distance)>, SearchStats)> {
        if self.is_empty() {
            return Err(VPTreeError::EmptyTree);
        }
        if k == 0 {
            return Ok((Vec::new(), SearchStats::default()));
        }
        // at most len() pairs can ever be kept
        let (found, stats) = self.search(needle, ResultSet::new(k.min(self.len())))?;
        trace!(
            "k-nn query: k {}, {} results, {} nodes visited, {} distance evaluations",
            k,
            found.len(),
            stats.nodes_visited,
            stats.distance_evaluations
        );
        Ok((found, stats))
    }

    /// All items within `radius` of `needle` (inclusive), ordered by
    /// ascending distance and then ascending index.
    pub fn find_within(
        &self,
        needle: &T,
        radius: T::Distance,
    ) -> Result<Vec<(usize, T::Distance)>> {
        self.find_nearest_custom(needle, WithinRadius::new(radius))
    }

    /// Run the branch-and-bound traversal with a caller-supplied
    /// candidate collector.
    pub fn find_nearest_custom<C>(&self, needle: &T, candidate: C) -> Result<C::Output>
    where
        C: BestCandidate<T::Distance>,
    {
        if self.is_empty() {
            return Err(VPTreeError::EmptyTree);
        }
        self.search(needle, candidate).map(|(output, _)| output)
    }

    fn search<C>(&self, needle: &T, mut candidate: C) -> Result<(C::Output, SearchStats)>
    where
        C: BestCandidate<T::Distance>,
    {
        let mut search = Search::new(self.items, self.context, needle);
        search.visit(&self.root, &mut candidate)?;
        Ok((candidate.result(), search.stats()))
    }

    /// Render the tree as a Graphviz digraph.
    pub fn dump(&self) -> String {
        format!("{:?}", self)
    }
}

impl<'a, T: MetricSpace> Debug for VPTree<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "digraph \"vp tree\" {{")?;
        // nodes are numbered in preorder, each edge written just before
        // the node it points to
        let mut id = 0;
        let mut stack = vec![(&self.root, None)];
        while let Some((node, parent)) = stack.pop() {
            let me = id;
            id += 1;
            if let Some((from, side)) = parent {
                writeln!(f, "  n{} -> n{} [label=\"{}\"];", from, me, side)?;
            }
            match *node {
                Node::Leaf { ref indices } => {
                    writeln!(f, "  n{} [shape=box, label=\"{:?}\"];", me, indices)?
                }
                Node::Internal { vantage, ref threshold, ref near, ref far } => {
                    writeln!(f, "  n{} [label=\"{} (mu = {})\"];", me, vantage, threshold)?;
                    stack.push((&**far, Some((me, "far"))));
                    stack.push((&**near, Some((me, "near"))));
                }
            }
        }
        write!(f, "}}")
    }
}
