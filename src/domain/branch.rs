use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// The three recognized branch categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Release,
    Dev,
    Feature,
}

impl BranchKind {
    /// The uppercase marker used when composing branch names
    pub fn marker(&self) -> &'static str {
        match self {
            BranchKind::Release => "RELEASE",
            BranchKind::Dev => "DEV",
            BranchKind::Feature => "FEATURE",
        }
    }
}

impl std::fmt::Display for BranchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}

/// Immutable value derived from a branch name that matches one of the
/// recognized grammars. `project` is present for Release and Dev branches
/// only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDescriptor {
    pub name: String,
    pub kind: BranchKind,
    pub date: NaiveDate,
    pub project: Option<String>,
}

// Recognized name grammars. The project/user segments are greedy, so a
// project name containing hyphen-digit runs still anchors the date on the
// last 8-digit token before the marker.
static RELEASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)-RELEASE-(\d{8})$").expect("release grammar"));
static DEV_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)-(?:DEV|dev)-(\d{8})$").expect("dev grammar"));
static FEATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^feat/(.+)-(\d{8})-QZ-\d{4}$").expect("feature grammar"));

// Branch creation accepts a wider requirement-number range than the
// feature grammar above recognizes. Both rules are kept as-is.
static REQ_NO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^QZ-\d{4,8}$").expect("req-no rule"));

/// Parse a branch name into a descriptor, or `None` when the name matches
/// none of the recognized grammars. Pure and total: never panics on any
/// input. An 8-digit token that is not a real calendar date yields `None`.
pub fn parse_branch(name: &str) -> Option<BranchDescriptor> {
    if let Some(caps) = RELEASE_RE.captures(name) {
        return Some(BranchDescriptor {
            name: name.to_string(),
            kind: BranchKind::Release,
            date: parse_compact_date(&caps[2])?,
            project: Some(caps[1].to_string()),
        });
    }

    if let Some(caps) = DEV_RE.captures(name) {
        return Some(BranchDescriptor {
            name: name.to_string(),
            kind: BranchKind::Dev,
            date: parse_compact_date(&caps[2])?,
            project: Some(caps[1].to_string()),
        });
    }

    if !name.starts_with("feat/") {
        return None;
    }
    if let Some(caps) = FEATURE_RE.captures(name) {
        return Some(BranchDescriptor {
            name: name.to_string(),
            kind: BranchKind::Feature,
            date: parse_compact_date(&caps[2])?,
            project: None,
        });
    }

    None
}

/// Check a requirement number against the creation-time rule (QZ plus 4-8
/// digits).
pub fn is_valid_req_no(req_no: &str) -> bool {
    REQ_NO_RE.is_match(req_no)
}

/// Parse an 8-digit `YYYYMMDD` token. The caller guarantees the shape via
/// the grammar; only calendar representability is decided here.
fn parse_compact_date(token: &str) -> Option<NaiveDate> {
    let year: i32 = token[0..4].parse().ok()?;
    let month: u32 = token[4..6].parse().ok()?;
    let day: u32 = token[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a date in the compact `YYYYMMDD` branch-name form.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
