//! Sorted top-k selection over a row of distances.

use std::cmp::Ordering;

/// One scored candidate: original position plus its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub index: usize,
    pub distance: f32,
}

/// Select the `top_k` smallest distances of a row, ascending, ties broken
/// by original position.
///
/// When `top_k` covers the whole row this is a plain sort. Otherwise a
/// partition first isolates the winners and only they are sorted, which
/// keeps selection linear in the row length. Comparing on
/// `(distance, index)` makes the order total for finite distances, so both
/// paths return identical output for the same input.
pub fn sorted_top_k(distances: &[f32], top_k: usize) -> Vec<Scored> {
    let mut scored: Vec<Scored> = distances
        .iter()
        .enumerate()
        .map(|(index, &distance)| Scored { index, distance })
        .collect();

    if top_k >= scored.len() {
        scored.sort_by(compare);
        scored
    } else {
        scored.select_nth_unstable_by(top_k.saturating_sub(1), compare);
        scored.truncate(top_k);
        scored.sort_by(compare);
        scored
    }
}

fn compare(a: &Scored, b: &Scored) -> Ordering {
    a.distance
        .partial_cmp(&b.distance)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.index.cmp(&b.index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_order() {
        let distances = vec![0.9, 0.1, 0.5, 0.3];
        let top = sorted_top_k(&distances, 4);

        let indices: Vec<usize> = top.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_partial_selection_agrees_with_full_sort() {
        let distances = vec![0.7, 0.2, 0.7, 0.2, 0.4, 0.9, 0.0, 0.4];

        let full = sorted_top_k(&distances, distances.len());
        for k in 1..distances.len() {
            let partial = sorted_top_k(&distances, k);
            assert_eq!(partial.as_slice(), &full[..k], "k = {k}");
        }
    }

    #[test]
    fn test_ties_broken_by_position() {
        let distances = vec![0.5, 0.2, 0.5, 0.2];
        let top = sorted_top_k(&distances, 3);

        let indices: Vec<usize> = top.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 3, 0]);
    }

    #[test]
    fn test_top_k_larger_than_row() {
        let distances = vec![0.3, 0.1];
        let top = sorted_top_k(&distances, 100);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].index, 1);
        assert_eq!(top[1].index, 0);
    }

    #[test]
    fn test_top_k_zero_returns_nothing() {
        let distances = vec![0.3, 0.1, 0.2];
        assert!(sorted_top_k(&distances, 0).is_empty());
    }

    #[test]
    fn test_empty_row() {
        assert!(sorted_top_k(&[], 5).is_empty());
    }
}
