use super::frame_index::IdBounds;

/// Tracks the current (train, pulse) position while stepping through the ID rectangle.
///
/// Pulses are the fast axis: advancing past the last pulse wraps to the first pulse of the
/// next train. Iteration is over once the train has moved past the last train of the
/// rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    bounds: IdBounds,
    train: u64,
    pulse: u64,
    /// The train would have wrapped past u64::MAX
    saturated: bool,
}

impl Cursor {
    /// Create a cursor at the first position of the rectangle
    pub fn new(bounds: IdBounds) -> Self {
        Self {
            bounds,
            train: bounds.min_train,
            pulse: bounds.min_pulse,
            saturated: false,
        }
    }

    /// Move back to (min train, min pulse)
    pub fn reset(&mut self) {
        self.train = self.bounds.min_train;
        self.pulse = self.bounds.min_pulse;
        self.saturated = false;
    }

    /// Step to the next position.
    ///
    /// Returns the new (train, pulse) while it lies inside the rectangle, None once the train
    /// has run past the last train. The position keeps moving on further calls until the
    /// cursor is reset.
    pub fn advance(&mut self) -> Option<(u64, u64)> {
        if self.saturated {
            return None;
        }
        match self.pulse.checked_add(1) {
            Some(pulse) if pulse <= self.bounds.max_pulse => self.pulse = pulse,
            _ => {
                self.pulse = self.bounds.min_pulse;
                match self.train.checked_add(1) {
                    Some(train) => self.train = train,
                    None => {
                        self.saturated = true;
                        return None;
                    }
                }
            }
        }
        if self.is_exhausted() {
            return None;
        }
        Some((self.train, self.pulse))
    }

    pub fn position(&self) -> (u64, u64) {
        (self.train, self.pulse)
    }

    pub fn current_train(&self) -> u64 {
        self.train
    }

    pub fn current_pulse(&self) -> u64 {
        self.pulse
    }

    /// Whether the cursor has moved past the last train
    pub fn is_exhausted(&self) -> bool {
        self.saturated || self.train > self.bounds.max_train
    }

    pub fn bounds(&self) -> &IdBounds {
        &self.bounds
    }
}
