use vptree::{BuildConfig, MetricSpace, VPTree, VantageSelection};

#[derive(Debug, PartialEq, Clone)]
struct Point(f32);

impl MetricSpace for Point {
    type Distance = f32;
    type Context = ();

    fn distance(&self, a: &Self, _: &()) -> f32 {
        (self.0 - a.0).abs()
    }
}

fn check_self_nearest(points: &[Point], config: BuildConfig) {
    let vp = VPTree::build(points, &(), config).unwrap();

    for (i, p) in points.iter().enumerate() {
        // each point should be nearest to itself.
        let found = vp.find_nearest(p).unwrap();
        assert_eq!(found, (i, 0.0), "\n{}", vp.dump());
    }
}

#[test]
fn test_linear() {
    for n in 10..101 {
        let points: Vec<_> = (0..n + 1).map(|x| Point(x as f32 / n as f32)).collect();
        check_self_nearest(&points, BuildConfig::default().seed(n as u64));
    }
}

#[test]
fn test_harmonic() {
    for n in 10..101 {
        let points: Vec<_> = (1..n + 1).map(|x| Point(1.0 / (x as f32))).collect();
        check_self_nearest(&points, BuildConfig::default().seed(n as u64));
    }
}

#[test]
fn test_harmonic_first_vantage() {
    // sorted input is the worst case for first-item vantage selection
    for n in 10..101 {
        let points: Vec<_> = (1..n + 1).map(|x| Point(1.0 / (x as f32))).collect();
        let config = BuildConfig::default().vantage(VantageSelection::First).leaf_size(3);
        check_self_nearest(&points, config);
    }
}
