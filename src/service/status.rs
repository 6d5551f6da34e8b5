use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc, Weekday,
};

use crate::model::{attendance::AttendanceStatus, permission::PermissionType};

/// Clock rules of the organization: where its working day is anchored and
/// when an arrival counts as late.
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    pub offset: FixedOffset,
    pub late_threshold: NaiveTime,
    /// How far an approved morning permission pushes the threshold.
    pub permission_grace: Duration,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            late_threshold: NaiveTime::from_hms_opt(9, 15, 0).expect("09:15 is a valid time"),
            permission_grace: Duration::minutes(120),
        }
    }
}

impl AttendancePolicy {
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset).naive_local()
    }

    /// Calendar day an instant belongs to.
    pub fn today(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date()
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        self.local(instant).time()
    }

    /// The instant a local wall-clock time on `date` corresponds to.
    pub fn instant_at(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(time) - Duration::seconds(self.offset.local_minus_utc() as i64);
        Utc.from_utc_datetime(&local)
    }

    pub fn threshold_for(&self, permission: Option<PermissionType>) -> NaiveTime {
        match permission {
            Some(PermissionType::Morning) => self.late_threshold + self.permission_grace,
            _ => self.late_threshold,
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Status decided at check-in. The three rules run in this order and the
/// order matters:
///
/// 1. arriving strictly after `threshold` makes the day a half day;
/// 2. a holiday forces `present`;
/// 3. on a weekend that is not a holiday, a day that is still exactly
///    `present` becomes a half day.
///
/// A holiday on a weekend therefore stays `present`, whatever the clock.
pub fn derive_check_in_status(
    clock: NaiveTime,
    date: NaiveDate,
    threshold: NaiveTime,
    is_holiday: bool,
) -> AttendanceStatus {
    let mut status = if clock > threshold {
        AttendanceStatus::HalfDay
    } else {
        AttendanceStatus::Present
    };

    if is_holiday {
        status = AttendanceStatus::Present;
    }

    if is_weekend(date) && status == AttendanceStatus::Present && !is_holiday {
        status = AttendanceStatus::HalfDay;
    }

    status
}
