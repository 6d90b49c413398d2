use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// WhatsApp permits free-form outbound replies only within 24 hours of the
/// last inbound message. Template sends are exempt and checked elsewhere.
pub const SESSION_WINDOW_HOURS: i64 = 24;

pub fn session_window_open(last_interaction_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_interaction_at {
        Some(last) => now - last < Duration::hours(SESSION_WINDOW_HOURS),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_within_23_hours() {
        let now = Utc::now();
        assert!(session_window_open(Some(now - Duration::hours(23)), now));
    }

    #[test]
    fn closed_after_25_hours() {
        let now = Utc::now();
        assert!(!session_window_open(Some(now - Duration::hours(25)), now));
    }

    #[test]
    fn closed_without_prior_contact() {
        assert!(!session_window_open(None, Utc::now()));
    }
}
