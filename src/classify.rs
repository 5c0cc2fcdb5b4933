//! Intent classification for incoming messages.
//!
//! Classification is a fixed, ordered rule table over the lower-cased,
//! trimmed message. The first matching rule wins, so priority is encoded
//! by position: a greeting beats a domain keyword, a time query beats a
//! person mention, and so on. Messages that match nothing fall through to
//! [`Intent::GeneralQuery`].
//!
//! All tables are compiled in. The classifier never touches the network
//! or the corpus, which keeps the fixed-reply paths fast and dependable
//! even when every provider is down.

/// A supported secondary timezone, keyed by the region token that appears
/// in messages ("time in dubai"). All supported zones are DST-free, so a
/// fixed UTC offset is exact year-round.
#[derive(Debug, PartialEq, Eq)]
pub struct RegionZone {
    pub token: &'static str,
    pub label: &'static str,
    pub offset_secs: i32,
}

/// A known person the assistant can introduce.
#[derive(Debug, PartialEq, Eq)]
pub struct Person {
    pub token: &'static str,
    pub name: &'static str,
    pub bio: &'static str,
}

/// The category a message resolves to, in priority order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Salutation; answered with the fixed capability reply.
    Greeting,
    /// Local time request, optionally for a named secondary region.
    TimeQuery(Option<&'static RegionZone>),
    /// Current date request, always answered in the reference timezone.
    DateQuery,
    /// Mention of a known person; their biography grounds the reply.
    IdentityQuery(&'static Person),
    /// Who-built-you question; answered with the fixed attribution.
    DeveloperIdentity,
    /// University-domain question; runs retrieval under strict grounding.
    DomainQuery,
    /// Everything else; generation under the open policy, no retrieval.
    GeneralQuery,
}

const GREETING_TOKENS: &[&str] = &["hi", "hello", "hey", "hai", "namaste"];

/// UTC offset of the reference timezone (IST, UTC+5:30).
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 1800;

pub const REGION_ZONES: &[RegionZone] = &[
    RegionZone { token: "india", label: "IST", offset_secs: IST_OFFSET_SECS },
    RegionZone { token: "punjab", label: "IST", offset_secs: IST_OFFSET_SECS },
    RegionZone { token: "phagwara", label: "IST", offset_secs: IST_OFFSET_SECS },
    RegionZone { token: "dubai", label: "GST", offset_secs: 4 * 3600 },
    RegionZone { token: "singapore", label: "SGT", offset_secs: 8 * 3600 },
    RegionZone { token: "tokyo", label: "JST", offset_secs: 9 * 3600 },
];

pub const PERSONS: &[Person] = &[
    Person {
        token: "sujith",
        name: "Sujith Lavudu",
        bio: "Sujith Lavudu is a Computer Science student at Lovely Professional \
              University and one of the two developers of the VertoSewa assistant. \
              They built the retrieval pipeline and the administrative content tooling.",
    },
    Person {
        token: "vennela",
        name: "Vennela Barnana",
        bio: "Vennela Barnana is a Computer Science student at Lovely Professional \
              University and one of the two developers of the VertoSewa assistant. \
              They designed the conversation flow and the assistant's response guidelines.",
    },
];

const DEVELOPER_PHRASES: &[&str] = &[
    "who developed you",
    "who created you",
    "who built you",
    "your developer",
];

const DOMAIN_TERMS: &[&str] = &[
    "lpu",
    "lovely professional university",
    "ums",
    "rms",
    "dsw",
    "attendance",
    "hostel",
    "fees",
    "exam",
    "semester",
    "registration",
    "reappear",
    "mid term",
    "end term",
];

type Rule = fn(&str) -> Option<Intent>;

const RULES: &[Rule] = &[
    greeting_rule,
    time_rule,
    date_rule,
    identity_rule,
    developer_rule,
    domain_rule,
];

/// Classify a raw message.
///
/// Trims and lower-cases once, then walks the rule table in priority
/// order. Blank input is the caller's concern; here it falls through to
/// [`Intent::GeneralQuery`] like any other unmatched text.
pub fn classify(message: &str) -> Intent {
    let text = message.trim().to_lowercase();
    RULES
        .iter()
        .find_map(|rule| rule(&text))
        .unwrap_or(Intent::GeneralQuery)
}

fn greeting_rule(text: &str) -> Option<Intent> {
    if GREETING_TOKENS.iter().any(|g| text.starts_with(g)) {
        Some(Intent::Greeting)
    } else {
        None
    }
}

fn time_rule(text: &str) -> Option<Intent> {
    if !text.contains("time") || text.contains("date") {
        return None;
    }
    let zone = REGION_ZONES
        .iter()
        .find(|z| text.contains(&format!("in {}", z.token)));
    Some(Intent::TimeQuery(zone))
}

fn date_rule(text: &str) -> Option<Intent> {
    if text.contains("date") {
        Some(Intent::DateQuery)
    } else {
        None
    }
}

fn identity_rule(text: &str) -> Option<Intent> {
    PERSONS
        .iter()
        .find(|p| text.contains(p.token))
        .map(Intent::IdentityQuery)
}

fn developer_rule(text: &str) -> Option<Intent> {
    if DEVELOPER_PHRASES.iter().any(|p| text.contains(p)) {
        Some(Intent::DeveloperIdentity)
    } else {
        None
    }
}

fn domain_rule(text: &str) -> Option<Intent> {
    if DOMAIN_TERMS.iter().any(|t| text.contains(t)) {
        Some(Intent::DomainQuery)
    } else {
        None
    }
}
