//! 1-D interval algebra over character offsets
//!
//! Spans are half-open `[start, end)` ranges measured in characters.
//! Merge and causal linking both rank overlap with intersection-over-union,
//! so the math lives here in one place.

/// A half-open character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered. Zero for inverted ranges.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Characters shared with `other`.
    pub fn intersection(&self, other: Span) -> usize {
        let lo = self.start.max(other.start);
        let hi = self.end.min(other.end);
        hi.saturating_sub(lo)
    }

    /// Width of the smallest range covering both spans.
    pub fn union_len(&self, other: Span) -> usize {
        let lo = self.start.min(other.start);
        let hi = self.end.max(other.end);
        hi.saturating_sub(lo)
    }

    /// Intersection-over-union in `[0, 1]`. Zero when the union is empty.
    pub fn iou(&self, other: Span) -> f64 {
        let union = self.union_len(other);
        if union == 0 {
            return 0.0;
        }
        self.intersection(other) as f64 / union as f64
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
