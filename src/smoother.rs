// Moving-average filter for the tracked fingertip.
use std::collections::VecDeque;

use crate::types::Point;

pub const DEFAULT_WINDOW: usize = 5;

/// Averages the last `capacity` raw points; the oldest sample drops out first.
pub struct PositionSmoother {
    history: VecDeque<Point>,
    capacity: usize,
}

impl PositionSmoother {
    /// A zero window is treated as a window of one (no smoothing).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { history: VecDeque::with_capacity(capacity), capacity }
    }

    /// Push `raw` and return the per-axis mean of everything held, rounded to nearest.
    pub fn filter(&mut self, raw: Point) -> Point {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(raw);

        let n = self.history.len() as f64;
        let (sx, sy) = self
            .history
            .iter()
            .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
        Point::new((sx as f64 / n).round() as i32, (sy as f64 / n).round() as i32)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PositionSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_of_one_passes_points_through() {
        let mut s = PositionSmoother::new(1);
        assert_eq!(s.filter(Point::new(100, 100)), Point::new(100, 100));
        assert_eq!(s.filter(Point::new(110, 90)), Point::new(110, 90));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn averages_over_points_seen_until_full() {
        let mut s = PositionSmoother::new(3);
        assert_eq!(s.filter(Point::new(0, 0)), Point::new(0, 0));
        assert_eq!(s.filter(Point::new(10, 20)), Point::new(5, 10));
        assert_eq!(s.filter(Point::new(20, 40)), Point::new(10, 20));
        // (10 + 20 + 60) / 3 once the first sample is evicted
        assert_eq!(s.filter(Point::new(60, 0)), Point::new(30, 20));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn matches_mean_of_tail_for_any_sequence() {
        let raw: Vec<Point> = (0..40)
            .map(|i| Point::new((i * 37) % 641 - 20, (i * 53) % 479))
            .collect();
        let n = DEFAULT_WINDOW;
        let mut s = PositionSmoother::default();
        for (i, &p) in raw.iter().enumerate() {
            let out = s.filter(p);
            let tail = &raw[(i + 1).saturating_sub(n)..=i];
            let mx = tail.iter().map(|p| p.x as f64).sum::<f64>() / tail.len() as f64;
            let my = tail.iter().map(|p| p.y as f64).sum::<f64>() / tail.len() as f64;
            assert_eq!(out, Point::new(mx.round() as i32, my.round() as i32));
            assert!(s.len() <= s.capacity());
            assert_eq!(s.len(), tail.len());
        }
    }

    #[test]
    fn rounds_to_nearest() {
        let mut s = PositionSmoother::new(2);
        s.filter(Point::new(0, 0));
        // mean (1.5, 0.5) rounds away from zero
        assert_eq!(s.filter(Point::new(3, 1)), Point::new(2, 1));
    }
}
