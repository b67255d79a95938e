use std::env;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::warn;

const DEFAULT_PLATFORM_FEE_PERCENT: f64 = 10.0;
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    /// Offset of the operating timezone from UTC, in minutes. Decides what "today" is.
    pub utc_offset_minutes: i32,
    pub platform_fee_percent: f64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            utc_offset_minutes: parse_var("SERVICE_UTC_OFFSET_MINUTES", 0)
                .filter(|minutes| FixedOffset::east_opt(minutes * 60).is_some())
                .unwrap_or_else(|| {
                    warn!("SERVICE_UTC_OFFSET_MINUTES missing or out of range, using UTC");
                    0
                }),
            platform_fee_percent: parse_var("PLATFORM_FEE_PERCENT", DEFAULT_PLATFORM_FEE_PERCENT)
                .filter(|percent| (0.0..=100.0).contains(percent))
                .unwrap_or_else(|| {
                    warn!("PLATFORM_FEE_PERCENT invalid, using {}", DEFAULT_PLATFORM_FEE_PERCENT);
                    DEFAULT_PLATFORM_FEE_PERCENT
                }),
            port: parse_var("PORT", DEFAULT_PORT).unwrap_or_else(|| {
                warn!("PORT invalid, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    pub fn operating_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Current calendar date in the operating timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.operating_offset()).date_naive()
    }
}

/// Unset variables yield the default; set but unparsable ones yield `None`.
fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Option<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().ok(),
        Err(_) => Some(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_offset(utc_offset_minutes: i32) -> AppConfig {
        AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "anon".to_string(),
            supabase_jwt_secret: "secret".to_string(),
            utc_offset_minutes,
            platform_fee_percent: 10.0,
            port: 3000,
        }
    }

    #[test]
    fn test_operating_offset() {
        let config = config_with_offset(-180);
        assert_eq!(config.operating_offset().local_minus_utc(), -180 * 60);
    }

    #[test]
    fn test_today_tracks_offset() {
        let utc_today = config_with_offset(0).today();
        let shifted = config_with_offset(12 * 60).today();
        let diff = (shifted - utc_today).num_days();
        assert!(diff == 0 || diff == 1);
    }

    #[test]
    fn test_is_configured() {
        let mut config = config_with_offset(0);
        assert!(config.is_configured());
        config.supabase_jwt_secret.clear();
        assert!(!config.is_configured());
    }
}
