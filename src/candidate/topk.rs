//! Bounded retention of the strongest corner responses.

use std::cmp::Ordering;

/// Corner response at an integer location of one pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Column at `level`.
    pub x: usize,
    /// Row at `level`.
    pub y: usize,
    /// Detector response.
    pub score: f32,
    /// Pyramid level the peak was found on.
    pub level: usize,
}

/// Ranks stronger peaks first; ties fall back to level then raster order.
fn rank(a: &Peak, b: &Peak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.level.cmp(&b.level))
        .then_with(|| a.y.cmp(&b.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Keeps the `k` best peaks, ordered strongest first at all times.
#[derive(Clone, Debug)]
pub struct TopK {
    k: usize,
    ranked: Vec<Peak>,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ranked: Vec::with_capacity(k.min(4096)),
        }
    }

    /// Inserts `peak` at its rank, dropping whatever falls past `k`.
    pub fn push(&mut self, peak: Peak) {
        let pos = self
            .ranked
            .partition_point(|kept| rank(kept, &peak) == Ordering::Less);
        if pos >= self.k {
            return;
        }
        self.ranked.insert(pos, peak);
        self.ranked.truncate(self.k);
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Retained peaks, strongest first.
    pub fn into_sorted_desc(self) -> Vec<Peak> {
        self.ranked
    }
}

#[cfg(test)]
mod tests {
    use super::{Peak, TopK};

    fn peak(x: usize, score: f32) -> Peak {
        Peak {
            x,
            y: 0,
            score,
            level: 0,
        }
    }

    #[test]
    fn keeps_strongest_in_order() {
        let mut topk = TopK::new(2);
        for (x, score) in [(0, 1.0), (1, 5.0), (2, 3.0), (3, 4.0)] {
            topk.push(peak(x, score));
        }
        assert_eq!(topk.len(), 2);
        let kept = topk.into_sorted_desc();
        assert_eq!(kept.iter().map(|p| p.x).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn ties_prefer_raster_order() {
        let mut topk = TopK::new(1);
        topk.push(peak(5, 2.0));
        topk.push(peak(2, 2.0));
        assert_eq!(topk.into_sorted_desc()[0].x, 2);
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut topk = TopK::new(0);
        topk.push(peak(0, 9.0));
        assert!(topk.is_empty());
    }
}
