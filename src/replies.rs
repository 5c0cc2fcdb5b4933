//! Fixed reply texts and locally computed time/date replies.
//!
//! Everything in this module is deterministic: canned strings for the
//! short-circuit intents and wall-clock formatting for time/date queries.
//! None of it depends on the corpus or the providers, so these paths keep
//! working when everything else is degraded.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::classify::{RegionZone, IST_OFFSET_SECS};

/// One-time reply for the first message of a new session.
pub const WELCOME: &str = "Welcome to LPU VertoSewa 🙏 I'm the official AI assistant for \
    Lovely Professional University. Ask me about academics, exams, UMS/RMS, hostels, fees, \
    or university policies.";

/// Reply for greeting messages.
pub const GREETING_REPLY: &str = "Hello 👋 I'm **LPU VertoSewa**, the official AI assistant \
    for **Lovely Professional University**.\n\nAsk me anything related to academics, exams, \
    UMS/RMS, hostels, fees, or university policies.";

/// Reply for empty or whitespace-only input.
pub const EMPTY_REJECTION: &str = "Please enter a valid question.";

/// Reply when generation fails after retries.
pub const GENERATION_APOLOGY: &str = "Sorry, I couldn't process that right now.";

/// Reply for who-built-you questions.
pub const DEVELOPER_ATTRIBUTION: &str = "I was developed by Sujith Lavudu and Vennela Barnana \
    for Lovely Professional University.";

/// Reply for domain questions when retrieval is empty and the fallback
/// tier is `decline` (or there is no static corpus to fall back to).
pub const STRICT_DECLINE: &str = "I don't have verified information on that yet. Please \
    contact the relevant university office for confirmation.";

/// Format the current time for a zone (IST when no zone is named).
pub fn time_reply(now_utc: DateTime<Utc>, zone: Option<&RegionZone>) -> String {
    let (offset_secs, label) = match zone {
        Some(z) => (z.offset_secs, z.label),
        None => (IST_OFFSET_SECS, "IST"),
    };
    let local = now_utc.with_timezone(&to_offset(offset_secs));
    format!("⏰ Time: {} ({})", local.format("%I:%M %p"), label)
}

/// Format the current date, always in the reference timezone.
pub fn date_reply(now_utc: DateTime<Utc>) -> String {
    let local = now_utc.with_timezone(&to_offset(IST_OFFSET_SECS));
    format!("📅 Date: {}", local.format("%d %B %Y"))
}

fn to_offset(secs: i32) -> FixedOffset {
    // Offsets come from the compiled-in zone table, so this never falls
    // back in practice.
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}
