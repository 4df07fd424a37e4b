//! A time zone with daylight-saving transitions at local midnight, for tests.
//!
//! Standard time is UTC-4 and summer time is UTC-3. In 2025:
//! - summer time ends at 2025-04-06 01:00 local, which falls back to 00:00, so
//!   00:00..01:00 on April 6 happens twice;
//! - summer time starts at 2025-09-07 00:00 local, which jumps to 01:00, so
//!   00:00..01:00 on September 7 never happens.

use chrono::{FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidnightDst;

fn standard() -> FixedOffset {
    FixedOffset::west_opt(4 * 3600).unwrap()
}

fn summer() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

fn utc(month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

impl TimeZone for MidnightDst {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        Self
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let fits = |offset: FixedOffset| {
            let as_utc = *local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            self.offset_from_utc_datetime(&as_utc) == offset
        };
        match (fits(summer()), fits(standard())) {
            (true, true) => LocalResult::Ambiguous(summer(), standard()),
            (true, false) => LocalResult::Single(summer()),
            (false, true) => LocalResult::Single(standard()),
            (false, false) => LocalResult::None,
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
    }

    fn offset_from_utc_datetime(&self, instant: &NaiveDateTime) -> FixedOffset {
        // Fall back at 04:00 UTC on April 6, spring forward at 04:00 UTC on
        // September 7.
        if *instant < utc(4, 6, 4) || *instant >= utc(9, 7, 4) {
            summer()
        } else {
            standard()
        }
    }
}
