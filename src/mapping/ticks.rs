//! Grid and zero-crossing tick detection
//!
//! Like an edge-triggered threshold, but the thresholds are every multiple of
//! a grid interval. A tick fires once whenever the sampled point moves into
//! a different grid cell, however large the step, and when y lands on or
//! jumps over zero.

/// Which event a tick marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickKind {
    /// x crossed a multiple of the x interval
    XGrid,
    /// y crossed a multiple of the y interval
    YGrid,
    /// y landed on or jumped over zero
    ZeroCross,
}

/// A tick to play this block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickTrigger {
    pub kind: TickKind,
    /// Main tone frequency when the tick fired
    pub frequency_hint: f64,
}

/// Sign of a y-value; anything that is neither positive nor negative
/// (zero or NaN) counts as zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Negative,
    Zero,
    Positive,
}

impl Sign {
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Sign::Negative
        } else if value > 0.0 {
            Sign::Positive
        } else {
            Sign::Zero
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Sign::Negative => -1,
            Sign::Zero => 0,
            Sign::Positive => 1,
        }
    }

    /// Landed exactly on zero, or skipped over it between samples
    pub fn crossed_zero(previous: Sign, current: Sign) -> bool {
        (previous != Sign::Zero && current == Sign::Zero)
            || (previous.as_i8() - current.as_i8()).abs() > 1
    }
}

/// Bucket-boundary detector for one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridQuantizer {
    interval: f64,
}

impl GridQuantizer {
    /// `interval` must be positive
    pub fn new(interval: f64) -> Self {
        Self { interval }
    }

    /// Index of the grid cell containing `value`
    pub fn bucket(&self, value: f64) -> f64 {
        (value / self.interval).floor()
    }

    /// True when `previous` and `current` lie in different cells.
    /// Non-finite samples never tick.
    pub fn crossed(&self, previous: f64, current: f64) -> bool {
        let before = self.bucket(previous);
        let after = self.bucket(current);
        before.is_finite() && after.is_finite() && before != after
    }
}

/// Last audible sample point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

/// Up to one trigger per kind
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ticks {
    slots: [Option<TickTrigger>; 3],
}

impl Ticks {
    fn push(&mut self, trigger: TickTrigger) {
        let slot = match trigger.kind {
            TickKind::XGrid => 0,
            TickKind::YGrid => 1,
            TickKind::ZeroCross => 2,
        };
        self.slots[slot] = Some(trigger);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TickTrigger> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, kind: TickKind) -> bool {
        self.iter().any(|t| t.kind == kind)
    }
}

/// Stateful tick detector: remembers the last audible point and its sign
#[derive(Debug, Clone, PartialEq)]
pub struct TickDetector {
    x_grid: Option<GridQuantizer>,
    y_grid: Option<GridQuantizer>,
    zero_ticks: bool,
    last: SamplePoint,
    last_sign: Sign,
}

impl TickDetector {
    /// Start tracking from `origin`, the point at the left edge of the graph
    pub fn new(
        x_ticks: Option<f64>,
        y_ticks: Option<f64>,
        zero_ticks: bool,
        origin: SamplePoint,
    ) -> Self {
        Self {
            x_grid: x_ticks.map(GridQuantizer::new),
            y_grid: y_ticks.map(GridQuantizer::new),
            zero_ticks,
            last: origin,
            last_sign: Sign::of(origin.y),
        }
    }

    pub fn last(&self) -> SamplePoint {
        self.last
    }

    pub fn last_sign(&self) -> Sign {
        self.last_sign
    }

    /// Compare `point` against the last observed point, then remember it
    pub fn observe(&mut self, point: SamplePoint, frequency: f64) -> Ticks {
        let mut ticks = Ticks::default();
        let sign = Sign::of(point.y);
        let trigger = |kind| TickTrigger {
            kind,
            frequency_hint: frequency,
        };

        if let Some(grid) = self.x_grid {
            if grid.crossed(self.last.x, point.x) {
                ticks.push(trigger(TickKind::XGrid));
            }
        }
        if let Some(grid) = self.y_grid {
            if grid.crossed(self.last.y, point.y) {
                ticks.push(trigger(TickKind::YGrid));
            }
        }
        if self.zero_ticks && Sign::crossed_zero(self.last_sign, sign) {
            ticks.push(trigger(TickKind::ZeroCross));
        }

        self.last = point;
        self.last_sign = sign;
        ticks
    }
}
