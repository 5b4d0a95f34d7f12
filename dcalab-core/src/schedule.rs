//! Investment schedule generation.
//!
//! Maps a [`SchedulePolicy`] to the concrete dates on which contributions are
//! made. Periodic policies anchor to period ends (month-end, week-ending
//! weekday), not to anniversaries of the start date: a monthly plan starting
//! on the 1st still contributes on the last day of each month.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// How investment dates are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulePolicy {
    /// Last calendar day of every month whose month-end lies in `[start, end]`.
    Monthly,

    /// Every `anchor` weekday in `[start, end]`, seven days apart.
    Weekly {
        #[serde(default = "default_weekly_anchor")]
        anchor: Weekday,
    },

    /// Caller-supplied dates, used verbatim. Duplicates are separate contributions.
    CustomDates { dates: Vec<NaiveDate> },
}

fn default_weekly_anchor() -> Weekday {
    Weekday::Sun
}

impl SchedulePolicy {
    /// Weekly plan anchored on the week-ending Sunday.
    pub fn weekly() -> Self {
        Self::Weekly {
            anchor: default_weekly_anchor(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly { .. } => "weekly",
            Self::CustomDates { .. } => "custom",
        }
    }
}

/// Produce the investment dates for `policy` over `[start, end]`.
///
/// Monthly and weekly plans return an empty vector when no anchor date falls
/// inside the range (for example a two-week window that contains no
/// month-end). Custom plans must be non-empty and are returned unchanged,
/// in the order given.
pub fn generate_schedule(
    policy: &SchedulePolicy,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, CoreError> {
    if start > end {
        return Err(CoreError::InvalidRange { start, end });
    }

    let dates = match policy {
        SchedulePolicy::Monthly => month_ends(start, end),
        SchedulePolicy::Weekly { anchor } => weekly_anchors(start, end, *anchor),
        SchedulePolicy::CustomDates { dates } => {
            if dates.is_empty() {
                return Err(CoreError::EmptySchedule);
            }
            dates.clone()
        }
    };

    debug!(
        policy = policy.name(),
        %start,
        %end,
        count = dates.len(),
        "generated investment schedule"
    );
    Ok(dates)
}

/// Last day of the given month, `None` past the calendar's upper bound.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

fn month_ends(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while let Some(me) = month_end(year, month) {
        if me > end {
            break;
        }
        out.push(me);
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    out
}

fn weekly_anchors(start: NaiveDate, end: NaiveDate, anchor: Weekday) -> Vec<NaiveDate> {
    let offset = (7 + anchor.num_days_from_monday() - start.weekday().num_days_from_monday()) % 7;
    let mut out = Vec::new();
    let mut current = start.checked_add_days(Days::new(u64::from(offset)));

    while let Some(date) = current {
        if date > end {
            break;
        }
        out.push(date);
        current = date.checked_add_days(Days::new(7));
    }
    out
}
