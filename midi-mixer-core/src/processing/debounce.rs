use std::time::{Duration, Instant};

/// Coalesces bursts of triggers into a single deadline.
///
/// Each `trigger` pushes the deadline to `now + quiet`, but never past
/// `first_trigger + max_wait`, so a steady stream of triggers cannot starve
/// the action. `throttle` arms the deadline only when nothing is pending,
/// which lets slow resync requests pile up behind one refresh instead of
/// postponing it.
///
/// Pure state: callers pass the current `Instant` and poll with `fire`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    max_wait: Duration,
    first_trigger: Option<Instant>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration, max_wait: Duration) -> Self {
        Self {
            quiet,
            max_wait: max_wait.max(quiet),
            first_trigger: None,
            deadline: None,
        }
    }

    /// Restart the quiet period.
    pub fn trigger(&mut self, now: Instant) {
        let first = *self.first_trigger.get_or_insert(now);
        let cap = first + self.max_wait;
        self.deadline = Some((now + self.quiet).min(cap));
    }

    /// Arm for `now + delay` unless a deadline is already pending.
    pub fn throttle(&mut self, now: Instant, delay: Duration) {
        if self.deadline.is_none() {
            self.first_trigger = Some(now);
            self.deadline = Some(now + delay);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true exactly once per armed deadline, when it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.first_trigger = None;
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_once_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 1000 * MS);
        d.trigger(t0);

        assert!(!d.fire(t0 + 99 * MS));
        assert!(d.fire(t0 + 100 * MS));
        assert!(!d.fire(t0 + 200 * MS));
        assert!(!d.is_pending());
    }

    #[test]
    fn burst_coalesces_into_one_fire() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 1000 * MS);
        let mut fired = 0;
        for i in 0..10u32 {
            let now = t0 + i * 20 * MS;
            d.trigger(now);
            if d.fire(now) {
                fired += 1;
            }
        }
        // last trigger at 180ms
        assert_eq!(d.deadline(), Some(t0 + 280 * MS));
        if d.fire(t0 + 300 * MS) {
            fired += 1;
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn max_wait_caps_postponement() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 250 * MS);
        for i in 0..20u32 {
            d.trigger(t0 + i * 50 * MS);
            if d.fire(t0 + i * 50 * MS) {
                assert!(i * 50 >= 250);
                return;
            }
        }
        panic!("debouncer never fired");
    }

    #[test]
    fn throttle_does_not_postpone_pending_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 1000 * MS);
        d.trigger(t0);
        d.throttle(t0 + 50 * MS, 5000 * MS);
        assert_eq!(d.deadline(), Some(t0 + 100 * MS));
    }

    #[test]
    fn repeated_throttle_keeps_first_deadline() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 1000 * MS);
        d.throttle(t0, 500 * MS);
        d.throttle(t0 + 400 * MS, 500 * MS);
        assert_eq!(d.deadline(), Some(t0 + 500 * MS));
    }

    #[test]
    fn trigger_pulls_throttled_deadline_forward() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(100 * MS, 1000 * MS);
        d.throttle(t0, 5000 * MS);
        d.trigger(t0 + 10 * MS);
        assert_eq!(d.deadline(), Some(t0 + 110 * MS));
    }
}
