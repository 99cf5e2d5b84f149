use chrono::{DateTime, Duration, Utc};

/// A value that only settles after it stopped changing for `delay`.
///
/// Driven by the caller's clock: [`Debounced::set`] restarts the timer and
/// [`Debounced::poll`] commits the pending value once the delay has elapsed.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    settled: T,
    pending: Option<(T, DateTime<Utc>)>,
    delay: Duration,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            settled: initial,
            pending: None,
            delay,
        }
    }

    /// Records new input and restarts the timer.
    pub fn set(&mut self, value: T, now: DateTime<Utc>) {
        self.pending = Some((value, now));
    }

    /// Most recent input, settled or not.
    pub fn latest(&self) -> &T {
        self.pending
            .as_ref()
            .map_or(&self.settled, |(value, _)| value)
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Commits the pending value if it is old enough. Returns it only when it
    /// differs from what was settled before.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.signed_duration_since(*at) >= self.delay => self.flush(),
            _ => None,
        }
    }

    /// Commits the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        let (value, _) = self.pending.take()?;
        if value == self.settled {
            return None;
        }
        self.settled = value.clone();
        Some(value)
    }

    /// Takes `value` as settled from outside. A pending input that differs
    /// from it keeps its timer.
    pub fn sync_settled(&mut self, value: T) {
        if self
            .pending
            .as_ref()
            .is_some_and(|(pending, _)| *pending == value)
        {
            self.pending = None;
        }
        self.settled = value;
    }

    /// Time left until the pending value settles.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let (_, at) = self.pending.as_ref()?;
        let left = self.delay - now.signed_duration_since(*at);
        Some(left.max(Duration::zero()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()
    }

    fn ms(value: i64) -> Duration {
        Duration::milliseconds(value)
    }

    #[test]
    fn settles_only_after_quiet_period() {
        let mut search = Debounced::new(String::new(), ms(400));

        search.set("a".to_owned(), t0());
        search.set("ab".to_owned(), t0() + ms(100));
        search.set("abc".to_owned(), t0() + ms(200));

        assert_eq!(search.poll(t0() + ms(500)), None);
        assert_eq!(search.latest(), "abc");
        assert_eq!(search.settled(), "");

        assert_eq!(search.poll(t0() + ms(600)), Some("abc".to_owned()));
        assert_eq!(search.settled(), "abc");
        assert!(!search.is_pending());
        assert_eq!(search.poll(t0() + ms(2000)), None);
    }

    #[test]
    fn unchanged_value_is_not_reported() {
        let mut search = Debounced::new("fund".to_owned(), ms(400));
        search.set("fun".to_owned(), t0());
        search.set("fund".to_owned(), t0() + ms(50));

        assert_eq!(search.poll(t0() + ms(1000)), None);
        assert!(!search.is_pending());
    }

    #[test]
    fn remaining_counts_down_to_zero() {
        let mut search = Debounced::new(String::new(), ms(400));
        assert_eq!(search.remaining(t0()), None);

        search.set("x".to_owned(), t0());
        assert_eq!(search.remaining(t0() + ms(150)), Some(ms(250)));
        assert_eq!(search.remaining(t0() + ms(900)), Some(Duration::zero()));
    }

    #[test]
    fn external_settle_keeps_newer_input() {
        let mut search = Debounced::new(String::new(), ms(400));
        search.set("abcd".to_owned(), t0());

        search.sync_settled("abc".to_owned());
        assert_eq!(search.settled(), "abc");
        assert_eq!(search.latest(), "abcd");
        assert_eq!(search.poll(t0() + ms(400)), Some("abcd".to_owned()));

        search.set("lp".to_owned(), t0() + ms(500));
        search.sync_settled("lp".to_owned());
        assert!(!search.is_pending());
    }

    #[test]
    fn flush_commits_immediately() {
        let mut search = Debounced::new(String::new(), ms(400));
        search.set("lp".to_owned(), t0());

        assert_eq!(search.flush(), Some("lp".to_owned()));
        assert_eq!(search.settled(), "lp");
    }
}
