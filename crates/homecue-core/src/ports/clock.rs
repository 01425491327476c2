//! Clock port - 時刻の抽象化
//!
//! - SystemClock: 本番用（ローカルタイムゾーンの 0 時を「今日」とする）
//! - FixedClock: テスト用（固定時刻 + 固定オフセット）

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

/// Clock は現在時刻と「今日の始まり」を提供
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Midnight at the start of the current local day, as a UTC instant.
    fn start_of_today(&self) -> DateTime<Utc>;

    /// Midnight at the start of the next local day. Not always 24 h after
    /// `start_of_today` (DST switch days are 23 or 25 h long).
    fn start_of_tomorrow(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn start_of_today(&self) -> DateTime<Utc> {
        let now = Local::now();
        local_midnight(now.date_naive(), *now.offset())
    }

    fn start_of_tomorrow(&self) -> DateTime<Utc> {
        let now = Local::now();
        match now.date_naive().succ_opt() {
            Some(tomorrow) => local_midnight(tomorrow, *now.offset()),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

/// Local midnight of `date`. Midnight may not exist on a DST switch day;
/// then `fallback` (the current offset) is used.
fn local_midnight(date: NaiveDate, fallback: FixedOffset) -> DateTime<Utc> {
    let midnight = midnight_of(date);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| at_offset(midnight, fallback))
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Frozen at `now`, with days starting at UTC midnight.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    /// Frozen at `now`, with days starting at midnight in `offset`.
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    fn local_date(&self) -> NaiveDate {
        self.now.with_timezone(&self.offset).date_naive()
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn start_of_today(&self) -> DateTime<Utc> {
        at_offset(midnight_of(self.local_date()), self.offset)
    }

    fn start_of_tomorrow(&self) -> DateTime<Utc> {
        match self.local_date().succ_opt() {
            Some(tomorrow) => at_offset(midnight_of(tomorrow), self.offset),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

fn midnight_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn at_offset(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    (local - offset).and_utc()
}
