//! Reduce-on-plateau learning rate scheduler
//!
//! Watches a metric that should go down (validation loss) once per
//! epoch. When it has failed to improve for `patience` consecutive
//! epochs, the learning rate is multiplied by `factor` and the
//! counter restarts.
//!
//! "Improve" is relative: `metric < best · (1 − threshold)`.

/// Reduce-on-plateau scheduler.
#[derive(Debug, Clone)]
pub struct PlateauScheduler {
    lr:         f64,
    factor:     f64,
    patience:   usize,
    threshold:  f64,
    min_lr:     f64,
    best:       f64,
    bad_epochs: usize,
}

impl PlateauScheduler {
    /// Factor 0.1, relative threshold 1e-4, no lower bound.
    pub fn new(initial_lr: f64, patience: usize) -> Self {
        Self {
            lr: initial_lr,
            factor: 0.1,
            patience,
            threshold: 1e-4,
            min_lr: 0.0,
            best: f64::INFINITY,
            bad_epochs: 0,
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_min_lr(mut self, min_lr: f64) -> Self {
        self.min_lr = min_lr;
        self
    }

    /// Current learning rate
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Feed one epoch's metric. Returns true if the learning rate was reduced.
    pub fn step(&mut self, metric: f64) -> bool {
        if metric < self.best * (1.0 - self.threshold) {
            self.best = metric;
            self.bad_epochs = 0;
            return false;
        }

        self.bad_epochs += 1;
        if self.bad_epochs < self.patience.max(1) {
            return false;
        }
        self.bad_epochs = 0;

        let reduced = (self.lr * self.factor).max(self.min_lr);
        // Ignore reductions too small to matter
        if self.lr - reduced > 1e-8 {
            tracing::info!("Reducing learning rate {:.3e} → {:.3e}", self.lr, reduced);
            self.lr = reduced;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_improving_metric_keeps_lr() {
        let mut s = PlateauScheduler::new(1e-3, 2);
        for loss in [0.9, 0.8, 0.7, 0.6] {
            assert!(!s.step(loss));
        }
        assert_abs_diff_eq!(s.lr(), 1e-3);
    }

    #[test]
    fn test_reduces_after_patience_bad_epochs() {
        let mut s = PlateauScheduler::new(1e-3, 3);
        s.step(0.5);
        let before = s.lr();

        assert!(!s.step(0.5));
        assert!(!s.step(0.6));
        assert!(s.step(0.55));
        assert!(s.lr() < before);
        assert_abs_diff_eq!(s.lr(), 1e-4, epsilon = 1e-12);
    }

    #[test]
    fn test_improvement_resets_counter() {
        let mut s = PlateauScheduler::new(1.0, 2);
        s.step(1.0);
        s.step(1.1);      // bad 1
        s.step(0.5);      // improvement, reset
        assert!(!s.step(0.6)); // bad 1
        assert!(s.step(0.7));  // bad 2 → reduce
    }

    #[test]
    fn test_threshold_is_relative() {
        let mut s = PlateauScheduler::new(1.0, 1);
        s.step(1.0);
        // 0.99995 is within 1e-4 of the best: not an improvement
        assert!(s.step(0.99995));
    }

    #[test]
    fn test_respects_min_lr() {
        let mut s = PlateauScheduler::new(1.0, 1).with_factor(0.5).with_min_lr(0.4);
        s.step(1.0);
        assert!(s.step(2.0));
        assert_abs_diff_eq!(s.lr(), 0.5);
        assert!(s.step(2.0));
        assert_abs_diff_eq!(s.lr(), 0.4);
        // already at the floor
        assert!(!s.step(2.0));
    }
}
