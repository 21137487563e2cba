use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use chrono_tz::Asia::Kolkata;

use crate::config::Config;

/// NSE cash-session window, evaluated in exchange-local time.
pub struct MarketHours {
    open_min: u32,
    close_min: u32,
}

impl MarketHours {
    pub fn new(cfg: &Config) -> Self {
        let (oh, om) = cfg.market_hours.open;
        let (ch, cm) = cfg.market_hours.close;
        Self {
            open_min: oh * 60 + om,
            close_min: ch * 60 + cm,
        }
    }

    pub fn is_open(&self, utc_now: DateTime<Utc>) -> bool {
        let local = utc_now.with_timezone(&Kolkata);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let minute = local.hour() * 60 + local.minute();
        minute >= self.open_min && minute < self.close_min
    }

    pub fn local_time_label(utc_now: DateTime<Utc>) -> String {
        utc_now.with_timezone(&Kolkata).format("%a %H:%M IST").to_string()
    }
}
