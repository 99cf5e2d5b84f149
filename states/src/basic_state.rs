use std::any::Any;

use chrono::{DateTime, Duration, Utc};

use crate::State;

/// Virtual "now" for the current frame.
///
/// The UI refreshes it once per frame with [`Time::tick`]; tests set or
/// advance it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    virt: DateTime<Utc>,
}

impl Default for Time {
    fn default() -> Self {
        Self { virt: Utc::now() }
    }
}

impl Time {
    pub fn at(virt: DateTime<Utc>) -> Self {
        Self { virt }
    }

    /// Sync with the wall clock.
    pub fn tick(&mut self) {
        self.virt = Utc::now();
    }

    pub fn set(&mut self, virt: DateTime<Utc>) {
        self.virt = virt;
    }

    pub fn advance(&mut self, by: Duration) {
        self.virt += by;
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.virt
    }
}

impl State for Time {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl AsMut<DateTime<Utc>> for Time {
    fn as_mut(&mut self) -> &mut DateTime<Utc> {
        &mut self.virt
    }
}

impl AsRef<DateTime<Utc>> for Time {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.virt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advance_moves_virtual_clock() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let mut time = Time::at(start);

        time.advance(Duration::milliseconds(400));

        assert_eq!(time.now() - start, Duration::milliseconds(400));
        assert_eq!(*time.as_ref(), time.now());
    }
}
