// ============================================================
// Layer 5 — Early Stopping
// ============================================================
// An epoch improves when the monitored metric drops below
// `best − min_delta`. Every other epoch (including a NaN metric)
// increments `wait`; training halts once `wait` reaches `patience`.
// With patience p, a metric that plateaus for p + 1 consecutive
// epochs stops training at the last of them.

use crate::domain::training::{EarlyStoppingConfig, Monitor};

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    monitor:   Monitor,
    min_delta: f64,
    patience:  usize,
    best:      Option<f64>,
    wait:      usize,
}

impl EarlyStopping {
    pub fn new(config: &EarlyStoppingConfig) -> Self {
        Self {
            monitor:   config.monitor,
            min_delta: config.min_delta,
            patience:  config.patience,
            best:      None,
            wait:      0,
        }
    }

    pub fn monitor(&self) -> Monitor {
        self.monitor
    }

    /// Best metric seen so far
    pub fn best(&self) -> Option<f64> {
        self.best
    }

    /// Record one epoch's metric. Returns true when training should halt.
    pub fn should_stop(&mut self, metric: f64) -> bool {
        let improved = match self.best {
            None => metric.is_finite(),
            Some(best) => metric < best - self.min_delta,
        };
        if improved {
            self.best = Some(metric);
            self.wait = 0;
            return false;
        }
        self.wait += 1;
        self.wait >= self.patience
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn stopper(patience: usize, min_delta: f64) -> EarlyStopping {
        EarlyStopping::new(&EarlyStoppingConfig { monitor: Monitor::Loss, min_delta, patience })
    }

    /// 1-based epoch at which training halts, if it does
    fn halt_epoch(stopper: &mut EarlyStopping, metrics: &[f64]) -> Option<usize> {
        metrics.iter().position(|&m| stopper.should_stop(m)).map(|i| i + 1)
    }

    #[test]
    fn test_plateau_halts_after_patience_plus_one_epochs() {
        // improves until epoch 2, then plateaus for epochs 2..=5
        let metrics = [1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5];
        assert_eq!(halt_epoch(&mut stopper(3, 0.0), &metrics), Some(5));
    }

    #[test]
    fn test_improvement_resets_wait() {
        let metrics = [1.0, 1.0, 0.9, 0.9, 0.8, 0.8, 0.8];
        assert_eq!(halt_epoch(&mut stopper(2, 0.0), &metrics), Some(7));
    }

    #[test]
    fn test_min_delta_ignores_small_gains() {
        let metrics = [1.0, 0.99, 0.98, 0.97];
        let mut s = stopper(2, 0.05);
        assert_eq!(halt_epoch(&mut s, &metrics), Some(3));
        assert_eq!(s.best(), Some(1.0));
    }

    #[test]
    fn test_steady_improvement_never_halts() {
        let metrics: Vec<f64> = (0..20).map(|i| 1.0 / (i + 1) as f64).collect();
        assert_eq!(halt_epoch(&mut stopper(1, 0.0), &metrics), None);
    }

    #[test]
    fn test_nan_counts_as_no_improvement() {
        let metrics = [0.5, f64::NAN, f64::NAN];
        assert_eq!(halt_epoch(&mut stopper(2, 0.0), &metrics), Some(3));
    }
}
