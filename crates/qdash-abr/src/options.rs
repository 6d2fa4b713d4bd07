use crate::error::{QdashError, QdashResult};

/// QDASH engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct QdashOptions {
    /// Throughput noise threshold, kbit/s.
    ///
    /// A STABLE engine enters TRANSITION only when the throughput delta
    /// between two evaluations exceeds this value. The default of `0.0`
    /// treats any nonzero delta (including float jitter) as a change, which
    /// keeps the reference behavior but likely defeats most of the smoothing.
    pub epsilon: f64,
    /// Whether [`PlaybackEvent::Seeking`](crate::PlaybackEvent::Seeking) resets the engine.
    pub reset_on_seek: bool,
}

impl Default for QdashOptions {
    fn default() -> Self {
        Self {
            epsilon: 0.0,
            reset_on_seek: true,
        }
    }
}

impl QdashOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the throughput noise threshold (kbit/s).
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Enable or disable reset on seek notifications.
    #[must_use]
    pub fn with_reset_on_seek(mut self, reset_on_seek: bool) -> Self {
        self.reset_on_seek = reset_on_seek;
        self
    }

    /// Check option values. Called by every engine constructor.
    ///
    /// # Errors
    ///
    /// Returns [`QdashError::InvalidOption`] when `epsilon` is negative or not finite.
    pub fn validate(&self) -> QdashResult<()> {
        if !self.epsilon.is_finite() {
            return Err(QdashError::invalid_option("epsilon", "must be finite"));
        }
        if self.epsilon < 0.0 {
            return Err(QdashError::invalid_option(
                "epsilon",
                format!("must be non-negative, got {}", self.epsilon),
            ));
        }
        Ok(())
    }
}
