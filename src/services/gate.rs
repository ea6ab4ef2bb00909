use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::config::Config;
use crate::error::Result;
use crate::models::session::{is_sentinel, ClassSession};
use crate::validation::session::validate_session;

/// Where a session came from. Plain links only expire when they carry a
/// `made_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Token,
    Plain,
}

/// Outcome of the expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Active { expires_at: DateTime<Utc> },
    Expired,
}

/// Remaining link lifetime, floor-divided into whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLeft {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeLeft {
    /// Computes the time between `now` and `expires_at`, clamped at zero.
    pub fn until(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        let total = (expires_at - now).num_seconds().max(0) as u64;
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        self.hours * 3600 + self.minutes * 60 + self.seconds
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
    }
}

/// Everything the active page needs.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: ClassSession,
    pub formatted_date: String,
    /// `None` for plain links without a creation time.
    pub time_left: Option<TimeLeft>,
    pub watch_url: Option<String>,
}

/// The page a request ends on.
#[derive(Debug, Clone)]
pub enum PageState {
    Active(Box<SessionView>),
    Expired,
}

/// Parses the timestamp formats seen in links.
///
/// A trailing `+00:00` is rewritten to `Z` first. RFC 3339 with any offset,
/// naive `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) and bare dates are
/// accepted.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    let normalized = match trimmed.strip_suffix("+00:00") {
        Some(base) => format!("{}Z", base),
        None => trimmed.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Formats a live time as `23-August-2025`, or returns it verbatim when it
/// cannot be parsed.
pub fn format_live_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format("%-d-%B-%Y").to_string(),
        None => {
            tracing::debug!("Unparseable live time, showing raw value: {}", raw);
            raw.to_string()
        }
    }
}

/// Decides whether a link made at `made_at` is still valid at `now`.
///
/// A missing or unparseable `made_at` counts as expired.
pub fn check_expiry(made_at: Option<&str>, now: DateTime<Utc>, ttl: TimeDelta) -> Expiry {
    let Some(made_at) = made_at.and_then(parse_timestamp) else {
        return Expiry::Expired;
    };

    match made_at.checked_add_signed(ttl) {
        Some(expires_at) if now < expires_at => Expiry::Active { expires_at },
        _ => Expiry::Expired,
    }
}

/// Builds the watch link for a session.
///
/// Offline classes go through the download handler (`url`, `title`); online
/// classes go to the stream player (`playurl`, `pdf`). Sessions whose media
/// link is a placeholder get no watch link.
pub fn watch_url(session: &ClassSession, config: &Config) -> Option<String> {
    if is_sentinel(&session.class_media_url) {
        return None;
    }

    let (base, query) = if session.is_offline {
        (
            &config.download_handler_url,
            serde_urlencoded::to_string(&[
                ("url", session.class_media_url.as_str()),
                ("title", session.class_name.as_str()),
            ]),
        )
    } else {
        (
            &config.stream_player_url,
            serde_urlencoded::to_string(&[
                ("playurl", session.class_media_url.as_str()),
                ("pdf", session.slides_url.as_str()),
            ]),
        )
    };

    match query {
        Ok(query) => {
            let separator = if base.contains('?') { '&' } else { '?' };
            Some(format!("{}{}{}", base, separator, query))
        }
        Err(e) => {
            tracing::warn!("Failed to build watch link: {}", e);
            None
        }
    }
}

/// Runs a session through validation and the expiry check.
///
/// # Arguments
///
/// * `session` - The decoded session.
/// * `source` - Whether it came from a token or from plain parameters.
/// * `now` - The current time.
/// * `config` - The application's configuration.
///
/// # Returns
///
/// The page to render, or `AppError::MissingParameter`.
pub fn evaluate(
    session: ClassSession,
    source: SessionSource,
    now: DateTime<Utc>,
    config: &Config,
) -> Result<PageState> {
    validate_session(&session)?;

    let expiry = match (source, session.made_at.as_deref()) {
        (SessionSource::Plain, None) => None,
        (_, made_at) => Some(check_expiry(made_at, now, config.link_ttl)),
    };

    let time_left = match expiry {
        Some(Expiry::Expired) => {
            tracing::info!("⌛ Link expired for class: {}", session.class_name);
            return Ok(PageState::Expired);
        }
        Some(Expiry::Active { expires_at }) => Some(TimeLeft::until(now, expires_at)),
        None => None,
    };

    let formatted_date = format_live_date(&session.live_at_time);
    let watch_url = watch_url(&session, config);

    Ok(PageState::Active(Box::new(SessionView {
        session,
        formatted_date,
        time_left,
        watch_url,
    })))
}
