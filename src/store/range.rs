//! Score ranges for sorted-set queries

use std::fmt;

/// One end of a score range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBound {
    /// No limit on this side
    Unbounded,
    /// The score itself is part of the range
    Inclusive(f64),
    /// The score itself is excluded
    Exclusive(f64),
}

impl ScoreBound {
    /// Returns the bound value, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            ScoreBound::Unbounded => None,
            ScoreBound::Inclusive(v) | ScoreBound::Exclusive(v) => Some(*v),
        }
    }

    /// Returns true if the bound excludes its own value
    pub fn is_exclusive(&self) -> bool {
        matches!(self, ScoreBound::Exclusive(_))
    }

    /// Picks the tighter of two lower bounds. On equal values the exclusive
    /// bound is tighter.
    pub fn tighter_lower(self, other: ScoreBound) -> ScoreBound {
        match (self.value(), other.value()) {
            (None, _) => other,
            (_, None) => self,
            (Some(a), Some(b)) if a > b => self,
            (Some(a), Some(b)) if b > a => other,
            _ if other.is_exclusive() => other,
            _ => self,
        }
    }

    /// Picks the tighter of two upper bounds. On equal values the exclusive
    /// bound is tighter.
    pub fn tighter_upper(self, other: ScoreBound) -> ScoreBound {
        match (self.value(), other.value()) {
            (None, _) => other,
            (_, None) => self,
            (Some(a), Some(b)) if a < b => self,
            (Some(a), Some(b)) if b < a => other,
            _ if other.is_exclusive() => other,
            _ => self,
        }
    }
}

impl fmt::Display for ScoreBound {
    /// Renders in the `(` / `-inf` notation score-range commands use
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBound::Unbounded => write!(f, "inf"),
            ScoreBound::Inclusive(v) => write!(f, "{}", v),
            ScoreBound::Exclusive(v) => write!(f, "({}", v),
        }
    }
}

/// A score interval `[min, max]` with per-side inclusivity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: ScoreBound,
    pub max: ScoreBound,
}

impl ScoreRange {
    /// The whole score line
    pub fn all() -> Self {
        Self {
            min: ScoreBound::Unbounded,
            max: ScoreBound::Unbounded,
        }
    }

    /// Creates a range from two bounds
    pub fn new(min: ScoreBound, max: ScoreBound) -> Self {
        Self { min, max }
    }

    /// Inclusive range `[min, max]`
    pub fn between(min: f64, max: f64) -> Self {
        Self::new(ScoreBound::Inclusive(min), ScoreBound::Inclusive(max))
    }

    /// Narrows this range by another one
    pub fn intersect(self, other: ScoreRange) -> Self {
        Self {
            min: self.min.tighter_lower(other.min),
            max: self.max.tighter_upper(other.max),
        }
    }

    /// Returns true if no score can satisfy the range
    pub fn is_empty(&self) -> bool {
        match (self.min.value(), self.max.value()) {
            (Some(lo), Some(hi)) => {
                lo > hi || (lo == hi && (self.min.is_exclusive() || self.max.is_exclusive()))
            }
            _ => false,
        }
    }

    /// Returns true if the score lies inside the range
    pub fn contains(&self, score: f64) -> bool {
        let above_min = match self.min {
            ScoreBound::Unbounded => true,
            ScoreBound::Inclusive(v) => score >= v,
            ScoreBound::Exclusive(v) => score > v,
        };
        above_min && !self.is_above_max(score)
    }

    /// Returns true if the score lies past the upper end
    pub fn is_above_max(&self, score: f64) -> bool {
        match self.max {
            ScoreBound::Unbounded => false,
            ScoreBound::Inclusive(v) => score > v,
            ScoreBound::Exclusive(v) => score >= v,
        }
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = match self.min {
            ScoreBound::Unbounded => "-inf".to_string(),
            bound => bound.to_string(),
        };
        let max = match self.max {
            ScoreBound::Unbounded => "+inf".to_string(),
            bound => bound.to_string(),
        };
        write!(f, "[{} .. {}]", min, max)
    }
}
