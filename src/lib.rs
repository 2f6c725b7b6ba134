//! Exact nearest neighbor search over any metric space.
//!
//! Items only need a distance function (see [`MetricSpace`]); no
//! coordinates are ever required. A [`VPTree`] borrows the items and
//! answers queries with indices into the borrowed slice.
//!
//! ```
//! use vptree::{MetricSpace, VPTree};
//!
//! struct Point { x: f32, y: f32 }
//!
//! impl MetricSpace for Point {
//!     type Distance = f32;
//!     type Context = ();
//!
//!     fn distance(&self, other: &Self, _: &()) -> f32 {
//!         let dx = self.x - other.x;
//!         let dy = self.y - other.y;
//!         (dx * dx + dy * dy).sqrt()
//!     }
//! }
//!
//! let points = vec![Point { x: 2.0, y: 3.0 }, Point { x: 0.0, y: 1.0 }, Point { x: 4.0, y: 5.0 }];
//! let tree = VPTree::new(&points).unwrap();
//! let (index, _) = tree.find_nearest(&Point { x: 0.5, y: 1.5 }).unwrap();
//! assert_eq!(index, 1);
//! ```

mod builder;
pub mod config;
pub mod error;
pub mod median;
pub mod results;
mod search;
pub mod vptree;

pub use config::{BuildConfig, VantageSelection};
pub use error::{Result, VPTreeError};
pub use results::{BestCandidate, ResultSet, WithinRadius};
pub use search::SearchStats;
pub use vptree::{MetricSpace, Scalar, VPTree};
