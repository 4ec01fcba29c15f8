//! Fan-in barrier
//!
//! Counts arrivals of a known set of pending operations. The operation
//! that brings the count to zero sees `Arrival::Complete`, carrying
//! whether any arrival reported failure. Arrivals past completion are
//! ignored.

/// Outcome of one arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    Pending { remaining: usize },
    Complete { failed: bool },
    /// Barrier already completed
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    total: usize,
    arrived: usize,
    failed: bool,
}

impl Join {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            arrived: 0,
            failed: false,
        }
    }

    /// Expect `n` more arrivals; no effect once complete
    pub fn add(&mut self, n: usize) {
        if !self.is_complete() {
            self.total += n;
        }
    }

    pub fn arrive(&mut self, ok: bool) -> Arrival {
        if self.is_complete() {
            tracing::warn!("arrival after barrier completed ({} of {})", self.arrived, self.total);
            return Arrival::Ignored;
        }
        self.arrived += 1;
        self.failed |= !ok;
        if self.is_complete() {
            Arrival::Complete { failed: self.failed }
        } else {
            Arrival::Pending {
                remaining: self.remaining(),
            }
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.arrived)
    }

    pub fn is_complete(&self) -> bool {
        self.arrived >= self.total
    }

    pub fn failed(&self) -> bool {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completes_on_last_arrival() {
        let mut j = Join::new(3);
        assert_eq!(j.arrive(true), Arrival::Pending { remaining: 2 });
        j.add(1);
        assert_eq!(j.arrive(true), Arrival::Pending { remaining: 2 });
        assert_eq!(j.arrive(true), Arrival::Pending { remaining: 1 });
        assert_eq!(j.arrive(true), Arrival::Complete { failed: false });
        assert_eq!(j.arrive(true), Arrival::Ignored);
    }

    #[test]
    fn test_failure_is_sticky() {
        let mut j = Join::new(2);
        j.arrive(false);
        assert_eq!(j.arrive(true), Arrival::Complete { failed: true });
        assert!(j.failed());
    }
}
