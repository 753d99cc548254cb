/// Capacity ratio (percent) below which no attention is needed.
const MONITOR_PCT: f64 = 85.0;
/// Capacity ratio at which the situation warrants caution.
const CAUTION_PCT: f64 = 90.0;
/// Capacity ratio that triggers a cleanup cycle.
const CLEANUP_PCT: f64 = 95.0;
/// Cleanup drives projected usage down to this fraction of the ceiling.
/// Kept well below the trigger so adjacent cycles do not oscillate.
const CLEANUP_TARGET: f64 = 0.70;

/// The four-level response to a forecast-versus-capacity comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Safe,
    Monitor,
    Caution,
    Cleanup,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Safe => "SAFE",
            Action::Monitor => "MONITOR",
            Action::Caution => "CAUTION",
            Action::Cleanup => "CLEANUP",
        }
    }

    /// Numeric code used at the API boundary.
    pub fn code(&self) -> i32 {
        match self {
            Action::Safe => 0,
            Action::Monitor => 1,
            Action::Caution => 2,
            Action::Cleanup => 3,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub action: Action,
    pub projected_pct: f64,
    pub amount_to_delete_mb: f64,
}

/// Map a predicted occupancy against the capacity ceiling. A non-positive
/// ceiling disables the ladder entirely.
pub fn evaluate(predicted_mb: f64, limit_mb: f64) -> Evaluation {
    if limit_mb <= 0.0 {
        return Evaluation {
            action: Action::Safe,
            projected_pct: 0.0,
            amount_to_delete_mb: 0.0,
        };
    }

    let pct = predicted_mb / limit_mb * 100.0;
    let (action, amount) = if pct < MONITOR_PCT {
        (Action::Safe, 0.0)
    } else if pct < CAUTION_PCT {
        (Action::Monitor, 0.0)
    } else if pct < CLEANUP_PCT {
        (Action::Caution, 0.0)
    } else {
        (Action::Cleanup, (predicted_mb - limit_mb * CLEANUP_TARGET).max(0.0))
    };

    Evaluation {
        action,
        projected_pct: pct,
        amount_to_delete_mb: amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_below_85() {
        let eval = evaluate(800.0, 1000.0);
        assert_eq!(eval.action, Action::Safe);
        assert_eq!(eval.amount_to_delete_mb, 0.0);
        assert!((eval.projected_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_cleanup_target_amount() {
        // 980 / 1000 = 98% → delete down to the 700 MB target.
        let eval = evaluate(980.0, 1000.0);
        assert_eq!(eval.action, Action::Cleanup);
        assert!((eval.amount_to_delete_mb - 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_ladder_boundaries() {
        assert_eq!(evaluate(849.9, 1000.0).action, Action::Safe);
        assert_eq!(evaluate(850.0, 1000.0).action, Action::Monitor);
        assert_eq!(evaluate(899.9, 1000.0).action, Action::Monitor);
        assert_eq!(evaluate(900.0, 1000.0).action, Action::Caution);
        assert_eq!(evaluate(949.9, 1000.0).action, Action::Caution);
        assert_eq!(evaluate(950.0, 1000.0).action, Action::Cleanup);
    }

    #[test]
    fn test_nonpositive_limit_is_safe() {
        assert_eq!(evaluate(5000.0, 0.0).action, Action::Safe);
        assert_eq!(evaluate(5000.0, -10.0).action, Action::Safe);
    }

    #[test]
    fn test_cleanup_amount_never_negative() {
        // Predicted above the trigger but below the 70% target is impossible
        // (95% > 70%), yet the clamp keeps the formula total.
        let eval = evaluate(950.0, 1000.0);
        assert!(eval.amount_to_delete_mb >= 0.0);
    }
}
