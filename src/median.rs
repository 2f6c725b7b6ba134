//! Linear-time order statistics used to find the split distance of a node.

use rand::Rng;
use std::cmp::Ordering;
use std::cmp::Ordering::{Equal, Greater, Less};

/// Index of the median of a slice of one to three elements.
fn small_median_by<T, F>(arr: &[T], cmp: &F) -> usize
where
    F: Fn(&T, &T) -> Ordering,
{
    let le = |x: &T, y: &T| cmp(x, y) != Greater;

    match arr.len() {
        1 => 0,
        2 => {
            if le(&arr[0], &arr[1]) {
                0
            } else {
                1
            }
        }
        3 => {
            if le(&arr[1], &arr[2]) {
                if le(&arr[1], &arr[0]) {
                    if le(&arr[0], &arr[2]) {
                        0
                    } else {
                        2
                    }
                } else {
                    1
                }
            } else if le(&arr[2], &arr[0]) {
                if le(&arr[0], &arr[1]) {
                    0
                } else {
                    1
                }
            } else {
                2
            }
        }
        _ => unreachable!("small_median_by takes at most three elements"),
    }
}

/// Three-way partition around `arr[0]`.
///
/// Returns `(lt, gt)` such that afterwards `arr[..lt]` < pivot,
/// `arr[lt..gt]` == pivot and `arr[gt..]` > pivot.
fn partition3<T, F>(arr: &mut [T], cmp: &F) -> (usize, usize)
where
    F: Fn(&T, &T) -> Ordering,
{
    // arr[lt] always holds a pivot-equal element.
    let mut lt = 0;
    let mut i = 1;
    let mut gt = arr.len();
    while i < gt {
        match cmp(&arr[i], &arr[lt]) {
            Less => {
                arr.swap(lt, i);
                lt += 1;
                i += 1;
            }
            Greater => {
                gt -= 1;
                arr.swap(i, gt);
            }
            Equal => i += 1,
        }
    }
    (lt, gt)
}

/// Partial sort the elements such that `arr[k]` holds the element a full
/// sort would put there, every element before it is <= it and every
/// element after it is >= it.
///
/// The pivot is the median of three randomly drawn elements. Runs of
/// equal elements are split off in one pass, so heavily tied input stays
/// expected linear.
pub fn quick_select_by<T, R, F>(arr: &mut [T], k: usize, rng: &mut R, cmp: &F)
where
    R: Rng + ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    let n = arr.len();
    if n <= 1 || k >= n {
        return;
    }
    if n == 2 {
        if cmp(&arr[1], &arr[0]) == Less {
            arr.swap(0, 1);
        }
        return;
    }

    arr.swap(0, rng.gen_range(0..n));
    arr.swap(1, rng.gen_range(1..n));
    arr.swap(2, rng.gen_range(2..n));
    let mid_idx = small_median_by(&arr[0..3], cmp);
    arr.swap(0, mid_idx);

    let (lt, gt) = partition3(arr, cmp);

    // Recurse on (at most) one side
    if k < lt {
        quick_select_by(&mut arr[..lt], k, rng, cmp);
    } else if k >= gt {
        quick_select_by(&mut arr[gt..], k - gt, rng, cmp);
    }
}

/// Select the lower median of `arr` in place and return its position.
///
/// Panics on an empty slice.
pub fn lower_median_by<T, R, F>(arr: &mut [T], rng: &mut R, cmp: &F) -> usize
where
    R: Rng + ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    assert!(!arr.is_empty(), "median of an empty slice");
    let k = (arr.len() - 1) / 2;
    quick_select_by(arr, k, rng, cmp);
    k
}
