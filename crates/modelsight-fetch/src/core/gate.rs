/// Turns raw byte counts into a non-decreasing completion fraction.
#[derive(Debug, Clone, Default)]
pub struct ProgressGate {
    last: f64,
}

impl ProgressGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction for `written` of `expected` bytes, never below a value
    /// returned earlier. Unknown or zero totals hold the previous value.
    pub fn observe(&mut self, written: u64, expected: Option<u64>) -> f64 {
        if let Some(total) = expected.filter(|t| *t > 0) {
            let raw = (written as f64 / total as f64).clamp(0.0, 1.0);
            self.last = self.last.max(raw);
        }
        self.last
    }

    /// Terminal report of a successful transfer.
    pub fn complete(&mut self) -> f64 {
        self.last = 1.0;
        self.last
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_never_decreases() {
        let mut gate = ProgressGate::new();
        assert_eq!(gate.observe(50, Some(100)), 0.5);
        assert_eq!(gate.observe(10, Some(100)), 0.5);
        assert_eq!(gate.observe(150, Some(100)), 1.0);
    }

    #[test]
    fn test_unknown_total_holds() {
        let mut gate = ProgressGate::new();
        assert_eq!(gate.observe(1024, None), 0.0);
        assert_eq!(gate.observe(1024, Some(0)), 0.0);
        assert_eq!(gate.complete(), 1.0);
    }
}
