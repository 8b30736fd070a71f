use chrono::{Duration, NaiveTime, Timelike};

use crate::error::ConfigError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Opening hours of the business and the fixed width of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    opening: u32,
    closing: u32,
    width: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            opening: 9 * 60,
            closing: 20 * 60,
            width: 30,
        }
    }
}

impl BusinessHours {
    pub fn new(opening_hour: u32, closing_hour: u32, slot_minutes: u32) -> Result<Self, ConfigError> {
        if opening_hour >= closing_hour || closing_hour > 24 {
            return Err(ConfigError::InvalidHours {
                opening: opening_hour,
                closing: closing_hour,
            });
        }
        if slot_minutes == 0 {
            return Err(ConfigError::ZeroSlotWidth);
        }
        if slot_minutes > MINUTES_PER_DAY {
            return Err(ConfigError::SlotTooWide(slot_minutes));
        }
        Ok(Self {
            opening: opening_hour * 60,
            closing: closing_hour * 60,
            width: slot_minutes,
        })
    }

    pub fn slot_width(&self) -> Duration {
        Duration::minutes(i64::from(self.width))
    }

    /// Slot starts covering `[opening, closing)`. A trailing interval shorter
    /// than the slot width is dropped.
    pub fn slots(&self) -> Slots {
        Slots {
            next: self.opening,
            last_end: self.closing,
            width: self.width,
        }
    }

    pub fn slot_count(&self) -> usize {
        ((self.closing - self.opening) / self.width) as usize
    }

    /// True only for on-grid slot starts.
    pub fn contains(&self, slot: NaiveTime) -> bool {
        if slot.second() != 0 || slot.nanosecond() != 0 {
            return false;
        }
        let minute = slot.hour() * 60 + slot.minute();
        minute >= self.opening
            && minute + self.width <= self.closing
            && (minute - self.opening) % self.width == 0
    }

    /// Exclusive end of the slot. Wraps to 00:00 for a slot ending at midnight.
    pub fn slot_end(&self, slot: NaiveTime) -> NaiveTime {
        slot.overflowing_add_signed(self.slot_width()).0
    }
}

/// Lazy iterator over the day's slot starts. Clone it to replay the sequence.
#[derive(Debug, Clone)]
pub struct Slots {
    next: u32,
    last_end: u32,
    width: u32,
}

impl Iterator for Slots {
    type Item = NaiveTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next + self.width > self.last_end || self.next >= MINUTES_PER_DAY {
            return None;
        }
        let start = self.next;
        self.next += self.width;
        NaiveTime::from_hms_opt(start / 60, start % 60, 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next + self.width > self.last_end {
            0
        } else {
            ((self.last_end - self.next) / self.width) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Slots {}
