use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::catalog::EffectKind;

/// Day-of-year window for the pre-new-year falling-petal ambience
/// (January 10 through January 31).
const PETAL_FALL_WINDOW: std::ops::RangeInclusive<u32> = 10..=31;

/// Day-of-year window for the new-year celebration bursts (February 1
/// through the lantern-festival fortnight ending February 15).
const CELEBRATION_WINDOW: std::ops::RangeInclusive<u32> = 32..=46;

/// Seasonal overlay derived from the calendar, independent of the user's
/// selected player effect. The two occupy different visual layers and may
/// render simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HolidayMode {
    None,
    PetalFall,
    Celebration,
}

impl HolidayMode {
    /// Catalog entry backing this seasonal mode.
    pub fn effect(self) -> EffectKind {
        match self {
            HolidayMode::None => EffectKind::None,
            HolidayMode::PetalFall => EffectKind::PetalFall,
            HolidayMode::Celebration => EffectKind::Celebration,
        }
    }
}

/// Maps a calendar date to the seasonal overlay mode.
///
/// Total and pure: every date resolves to exactly one mode, the same mode
/// on every call, with no dependence on mutable process state.
pub fn resolve(date: NaiveDate) -> HolidayMode {
    let day = date.ordinal();
    if PETAL_FALL_WINDOW.contains(&day) {
        HolidayMode::PetalFall
    } else if CELEBRATION_WINDOW.contains(&day) {
        HolidayMode::Celebration
    } else {
        HolidayMode::None
    }
}
