//! Exchange session clock
//!
//! Stateless apart from its configuration: the time zone and the local-hour
//! boundaries of each session.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use super::Session;
use crate::config::SessionConfig;

/// Minutes since local midnight for a wall-clock time
pub fn bucket_for<T: Timelike>(local: &T) -> u32 {
    local.hour() * 60 + local.minute()
}

/// Everything ingestion needs to stamp a sample taken at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStamp {
    pub trading_date: NaiveDate,
    pub bucket: u32,
    pub session: Session,
}

/// Maps wall-clock time to session labels in the exchange time zone
#[derive(Debug, Clone)]
pub struct SessionClock {
    tz: Tz,
    pre_market_start: u32,
    regular_start: u32,
    post_market_start: u32,
    post_market_end: u32,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new_york()
    }
}

impl SessionClock {
    /// US equities: 04:00 pre-market, 09:00 regular, 16:00 post-market, 20:00 closed
    pub fn new_york() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            pre_market_start: 4,
            regular_start: 9,
            post_market_start: 16,
            post_market_end: 20,
        }
    }

    /// Build a clock from configuration
    pub fn from_config(config: &SessionConfig) -> anyhow::Result<Self> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid timezone {}: {}", config.timezone, e))?;

        Ok(Self {
            tz,
            pre_market_start: config.pre_market_start,
            regular_start: config.regular_start,
            post_market_start: config.post_market_start,
            post_market_end: config.post_market_end,
        })
    }

    /// Exchange time zone
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Session label for a local wall-clock time
    pub fn session_for(&self, local: NaiveTime) -> Session {
        let hour = local.hour();
        if hour >= self.regular_start && hour < self.post_market_start {
            Session::Regular
        } else if hour >= self.pre_market_start && hour < self.regular_start {
            Session::PreMarket
        } else if hour >= self.post_market_start && hour < self.post_market_end {
            Session::PostMarket
        } else {
            Session::Closed
        }
    }

    /// Convert a UTC instant to exchange-local time
    pub fn to_local(&self, now: DateTime<Utc>) -> DateTime<Tz> {
        now.with_timezone(&self.tz)
    }

    pub fn now_local(&self) -> DateTime<Tz> {
        self.to_local(Utc::now())
    }

    /// Session label for a UTC instant
    pub fn session_at(&self, now: DateTime<Utc>) -> Session {
        self.session_for(self.to_local(now).time())
    }

    /// Current session label
    pub fn current_session(&self) -> Session {
        self.session_at(Utc::now())
    }

    /// Exchange-local calendar date of a UTC instant
    pub fn trading_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date_naive()
    }

    /// Today's exchange-local date
    pub fn today(&self) -> NaiveDate {
        self.trading_date(Utc::now())
    }

    /// Trading date, minute bucket and session for a UTC instant
    ///
    /// The bucket counts elapsed minutes since local midnight, so it keeps
    /// increasing through a repeated DST hour (a fall-back day runs past
    /// 1439) and skips ahead on a spring-forward day.
    pub fn stamp(&self, now: DateTime<Utc>) -> SessionStamp {
        let local = self.to_local(now);
        SessionStamp {
            trading_date: local.date_naive(),
            bucket: self.elapsed_bucket(&local),
            session: self.session_for(local.time()),
        }
    }

    fn elapsed_bucket(&self, local: &DateTime<Tz>) -> u32 {
        let midnight = local.date_naive().and_time(NaiveTime::MIN);
        let Some(start) = self.tz.from_local_datetime(&midnight).earliest() else {
            return bucket_for(local);
        };
        u32::try_from((*local - start).num_minutes()).unwrap_or_else(|_| bucket_for(local))
    }
}
