//! Power condition timers: read, validate and write.
//!
//! Timer values are kept in the device's native unit of 100 ms ("ticks"). Conversion from
//! seconds happens in [`crate::TimerRequest::ticks`].

use std::fmt;

use crate::{
    Error, Result, ScsiTransport,
    codec::{
        CommandLength, PageControl, PowerConditionData, cdb,
        mode::{POWER_CONDITION_PAGE, POWER_CONDITION_SUBPAGE},
    },
    request::TimerRequest,
    transport::{DataPhase, run},
};

/// The five standard power conditions, ordered by decreasing power draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PowerCondition {
    IdleA = 0,
    IdleB = 1,
    IdleC = 2,
    StandbyY = 3,
    StandbyZ = 4,
}

impl PowerCondition {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::IdleA,
        Self::IdleB,
        Self::IdleC,
        Self::StandbyY,
        Self::StandbyZ,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Letter used when displaying timers.
    pub const fn letter(self) -> char {
        match self {
            Self::IdleA => 'A',
            Self::IdleB => 'B',
            Self::IdleC => 'C',
            Self::StandbyY => 'Y',
            Self::StandbyZ => 'Z',
        }
    }

    /// Map a timer selector letter. `I` is an alias for Idle_A and `S` for Standby_Z.
    pub fn from_selector(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'I' | 'A' => Some(Self::IdleA),
            'B' => Some(Self::IdleB),
            'C' => Some(Self::IdleC),
            'Y' => Some(Self::StandbyY),
            'Z' | 'S' => Some(Self::StandbyZ),
            _ => None,
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for PowerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IdleA => "Idle_A",
            Self::IdleB => "Idle_B",
            Self::IdleC => "Idle_C",
            Self::StandbyY => "Standby_Y",
            Self::StandbyZ => "Standby_Z",
        };
        f.write_str(s)
    }
}

/// Set of power conditions. Bit `n` is the condition with index `n`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimerMask(u8);

impl TimerMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0x1F);

    /// Bits above the five conditions are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, cond: PowerCondition) -> bool {
        self.0 & cond.bit() != 0
    }

    pub fn insert(&mut self, cond: PowerCondition) {
        self.0 |= cond.bit();
    }

    pub const fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Members in logical order.
    pub fn iter(self) -> impl Iterator<Item = PowerCondition> {
        PowerCondition::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl std::ops::BitOr for TimerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl FromIterator<PowerCondition> for TimerMask {
    fn from_iter<I: IntoIterator<Item = PowerCondition>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for c in iter {
            mask.insert(c);
        }
        mask
    }
}

impl fmt::Debug for TimerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Timer state of one device, as read by [`read_timers`].
///
/// All arrays are indexed by [`PowerCondition::index`]. A condition whose enable bit is clear in
/// a given page reads as zero in the matching array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PowerTimers {
    /// Conditions the device reports as enabled.
    pub presence: TimerMask,
    /// Mirrors the PS bit of the current page.
    pub writable: bool,
    pub current: [u32; PowerCondition::COUNT],
    /// Bits of each timer the device allows to change.
    pub changeable: [u32; PowerCondition::COUNT],
    pub default: [u32; PowerCondition::COUNT],
}

impl PowerTimers {
    /// Whether writing `ticks` for the conditions in `mask` is allowed.
    ///
    /// Every requested condition must be present and every set bit of its value must be
    /// changeable. Adding conditions to `mask` never turns a rejection into an acceptance.
    pub fn accepts(&self, mask: TimerMask, ticks: &[u32; PowerCondition::COUNT]) -> bool {
        if !self.writable || mask.is_empty() || !mask.is_subset(self.presence) {
            return false;
        }
        mask.iter().all(|c| {
            let v = ticks[c.index()];
            v & self.changeable[c.index()] == v
        })
    }
}

fn sense<T: ScsiTransport + ?Sized>(
    dev: &mut T,
    length: CommandLength,
    pc: PageControl,
) -> Result<PowerConditionData> {
    let mut buf = vec![0; PowerConditionData::sense_len(length)];
    let cdb = cdb::mode_sense(
        length,
        pc,
        POWER_CONDITION_PAGE,
        POWER_CONDITION_SUBPAGE,
        buf.len() as u16,
    );
    let n = run(dev, &cdb, DataPhase::In(&mut buf))?;
    Ok(PowerConditionData::decode(length, &buf[..n.min(buf.len())])?)
}

/// MODE SENSE (10), then MODE SENSE (6) if the former fails.
fn sense_any<T: ScsiTransport + ?Sized>(
    dev: &mut T,
    pc: PageControl,
) -> Result<PowerConditionData> {
    sense(dev, CommandLength::C10, pc).or_else(|e| {
        tracing::warn!(?pc, "MODE SENSE (10) failed, falling back to MODE SENSE (6): {e}");
        sense(dev, CommandLength::C6, pc)
    })
}

/// Read current, changeable and default timers.
///
/// Only the current page is required. Failing changeable or default reads leave those arrays
/// zeroed.
pub fn read_timers<T: ScsiTransport + ?Sized>(dev: &mut T) -> Result<PowerTimers> {
    let current = sense_any(dev, PageControl::Current)?.page;
    let mut timers = PowerTimers {
        presence: current.enabled,
        writable: current.parameters_saveable,
        current: current.enabled_timers(),
        ..Default::default()
    };

    match sense_any(dev, PageControl::Changeable) {
        Ok(data) => timers.changeable = data.page.enabled_timers(),
        Err(e) => tracing::warn!("Changeable power condition values unavailable: {e}"),
    }
    match sense_any(dev, PageControl::Default) {
        Ok(data) => timers.default = data.page.enabled_timers(),
        Err(e) => tracing::warn!("Default power condition values unavailable: {e}"),
    }

    tracing::debug!(?timers, "Read power condition timers");
    Ok(timers)
}

fn write_with<T: ScsiTransport + ?Sized>(
    dev: &mut T,
    length: CommandLength,
    mask: TimerMask,
    ticks: &[u32; PowerCondition::COUNT],
) -> Result<()> {
    let mut data = sense(dev, length, PageControl::Current)?;
    for c in mask.iter() {
        data.page.timers[c.index()] = ticks[c.index()];
    }
    data.prepare_for_select();

    let raw = data.encode(length);
    let cdb = cdb::mode_select(length, raw.len() as u16, true);
    run(dev, &cdb, DataPhase::Out(&raw))?;
    Ok(())
}

/// Read-modify-write of the current Power Condition page with pages saved.
///
/// Timers outside `mask` keep the value just read. The 10 byte commands are tried first and the
/// whole sequence is repeated with 6 byte commands when they fail. No validation is done here,
/// see [`set_timers`].
pub fn write_timers<T: ScsiTransport + ?Sized>(
    dev: &mut T,
    mask: TimerMask,
    ticks: &[u32; PowerCondition::COUNT],
) -> Result<()> {
    write_with(dev, CommandLength::C10, mask, ticks).or_else(|e| {
        tracing::warn!("10 byte timer write failed, retrying with 6 byte commands: {e}");
        write_with(dev, CommandLength::C6, mask, ticks)
    })
}

/// Validate `request` against what the device reports and write it.
///
/// Fails with [`Error::NoTimers`] when the timers cannot be read and [`Error::NotWritable`] when
/// the request touches absent conditions or fixed bits.
pub fn set_timers<T: ScsiTransport + ?Sized>(dev: &mut T, request: &TimerRequest) -> Result<()> {
    let timers = read_timers(dev).map_err(|e| {
        tracing::info!("Power condition page unreadable: {e}");
        Error::NoTimers
    })?;

    let ticks = request.ticks();
    if !timers.accepts(request.mask(), &ticks) {
        tracing::info!(?timers, ?request, "Timer request rejected");
        return Err(Error::NotWritable);
    }

    write_timers(dev, request.mask(), &ticks)?;
    tracing::info!(?request, "Power condition timers written");
    Ok(())
}
