use std::str::FromStr;

use thiserror::Error;

use crate::timer::{PowerCondition, TimerMask};

/// Errors from parsing a timer request such as `A1800Z3600`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerParseError {
    #[error("No timer condition given.")]
    Empty,
    #[error("Unrecognized timer condition identifier.")]
    UnknownCondition(char),
    #[error("Duplicate timer condition identifiers not allowed.")]
    Duplicate(PowerCondition),
    #[error("Timer without a number is not allowed.")]
    MissingNumber(PowerCondition),
    #[error("Too large timer number.")]
    TooLarge(PowerCondition),
}

/// Timers a caller wants to set, in seconds.
///
/// Grammar: one or more `<selector><seconds>` pairs in any order, each condition at most once.
/// Selectors are `I`/`A`, `B`, `C`, `Y` and `Z`/`S`, case-insensitive. A value is rejected when it
/// no longer fits 32 bits once converted to 100 ms units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TimerRequest {
    mask: TimerMask,
    seconds: [u32; PowerCondition::COUNT],
}

impl TimerRequest {
    pub const fn mask(&self) -> TimerMask {
        self.mask
    }

    /// Requested value in seconds, `None` for conditions not requested.
    pub const fn seconds(&self, cond: PowerCondition) -> Option<u32> {
        if self.mask.contains(cond) {
            Some(self.seconds[cond.index()])
        } else {
            None
        }
    }

    /// Values in 100 ms units, zero for conditions not requested.
    pub fn ticks(&self) -> [u32; PowerCondition::COUNT] {
        // Parsing guarantees the product fits.
        self.seconds.map(|s| s * 10)
    }
}

const TICKS_PER_SECOND: u64 = 10;

impl FromStr for TimerRequest {
    type Err = TimerParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TimerParseError::Empty);
        }

        let mut req = Self::default();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            let cond = PowerCondition::from_selector(c).ok_or(TimerParseError::UnknownCondition(c))?;
            if req.mask.contains(cond) {
                return Err(TimerParseError::Duplicate(cond));
            }

            let mut value: u64 = 0;
            let mut digits = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                digits += 1;
                value = value * 10 + u64::from(d);
                if value > u64::from(u32::MAX) {
                    return Err(TimerParseError::TooLarge(cond));
                }
            }
            if digits == 0 {
                return Err(TimerParseError::MissingNumber(cond));
            }
            if value * TICKS_PER_SECOND > u64::from(u32::MAX) {
                return Err(TimerParseError::TooLarge(cond));
            }

            req.mask.insert(cond);
            req.seconds[cond.index()] = value as u32;
        }

        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_timer() {
        let req: TimerRequest = "Z7200".parse().unwrap();
        assert_eq!(req.mask().iter().collect::<Vec<_>>(), [PowerCondition::StandbyZ]);
        assert_eq!(req.seconds(PowerCondition::StandbyZ), Some(7200));
        assert_eq!(req.ticks()[PowerCondition::StandbyZ.index()], 72000);
    }

    #[test]
    fn two_timers_any_case() {
        let req: TimerRequest = "A1800Z3600".parse().unwrap();
        assert_eq!(req.seconds(PowerCondition::IdleA), Some(1800));
        assert_eq!(req.seconds(PowerCondition::StandbyZ), Some(3600));
        assert_eq!(req.seconds(PowerCondition::IdleB), None);

        let req: TimerRequest = "s60i5y0".parse().unwrap();
        assert_eq!(req.mask().bits(), 0b11001);
        assert_eq!(req.ticks(), [50, 0, 0, 0, 600]);
    }

    #[test]
    fn duplicates() {
        assert_eq!(
            "A100A200".parse::<TimerRequest>(),
            Err(TimerParseError::Duplicate(PowerCondition::IdleA))
        );
        // Aliases name the same condition.
        assert_eq!(
            "Z1S2".parse::<TimerRequest>(),
            Err(TimerParseError::Duplicate(PowerCondition::StandbyZ))
        );
    }

    #[test]
    fn missing_number() {
        assert_eq!(
            "B".parse::<TimerRequest>(),
            Err(TimerParseError::MissingNumber(PowerCondition::IdleB))
        );
        assert_eq!(
            "BC10".parse::<TimerRequest>(),
            Err(TimerParseError::MissingNumber(PowerCondition::IdleB))
        );
    }

    #[test]
    fn range() {
        assert_eq!(
            "A4294967296".parse::<TimerRequest>(),
            Err(TimerParseError::TooLarge(PowerCondition::IdleA))
        );
        // Fits 32 bits as seconds but not as 100 ms ticks.
        assert_eq!(
            "A429496730".parse::<TimerRequest>(),
            Err(TimerParseError::TooLarge(PowerCondition::IdleA))
        );
        let req: TimerRequest = "A429496729".parse().unwrap();
        assert_eq!(req.ticks()[0], 4_294_967_290);
    }

    #[test]
    fn junk() {
        assert_eq!(
            "X10".parse::<TimerRequest>(),
            Err(TimerParseError::UnknownCondition('X'))
        );
        assert_eq!(
            "A10 ".parse::<TimerRequest>(),
            Err(TimerParseError::UnknownCondition(' '))
        );
        assert_eq!("".parse::<TimerRequest>(), Err(TimerParseError::Empty));
    }
}
