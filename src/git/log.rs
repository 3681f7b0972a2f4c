use std::time::{SystemTime, UNIX_EPOCH};

/// Field separator inside one `git log` record (ASCII unit separator)
pub const FIELD_SEP: char = '\x1f';
/// Record separator between commits (ASCII record separator)
pub const RECORD_SEP: char = '\x1e';

/// `--pretty` format matching [`parse_log`]
pub const LOG_FORMAT: &str = "--pretty=format:%H%x1f%d%x1f%aN%x1f%aE%x1f%at%x1f%s%x1e";

/// One commit as listed by `git log`. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub hash: String,
    pub decoration: Decoration,
    pub author_name: String,
    pub author_email: String,
    /// Author time, seconds since the unix epoch
    pub timestamp: i64,
    pub subject: String,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        abbrev(&self.hash)
    }
}

/// Branch, tag and remote-ref labels attached to a commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoration {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
    pub refs: Vec<String>,
}

/// First 8 characters of a commit id (or the whole id if shorter)
pub fn abbrev(hash: &str) -> &str {
    match hash.char_indices().nth(8) {
        Some((idx, _)) => &hash[..idx],
        None => hash,
    }
}

/// Parse `git log` output produced with [`LOG_FORMAT`]. Malformed records are skipped.
pub fn parse_log(raw: &str) -> Vec<Commit> {
    raw.split(RECORD_SEP)
        .map(|record| record.trim_start_matches('\n'))
        .filter(|record| !record.is_empty())
        .filter_map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Option<Commit> {
    let mut fields = record.splitn(6, FIELD_SEP);
    let hash = fields.next()?.trim().to_string();
    let decoration = parse_decoration(fields.next()?);
    let author_name = fields.next()?.to_string();
    let author_email = fields.next()?.to_string();
    let timestamp = fields.next()?.trim().parse().ok()?;
    let subject = fields.next().unwrap_or("").trim_end().to_string();

    if hash.is_empty() {
        return None;
    }

    Some(Commit {
        hash,
        decoration,
        author_name,
        author_email,
        timestamp,
        subject,
    })
}

/// Split a `%d` decoration such as ` (HEAD -> main, tag: v1.0, origin/main)`.
///
/// `HEAD -> x` yields branch `x`, `tag: t` yields tag `t`, anything shaped like
/// `remote/name` is a remote ref, and every other label is a branch.
pub fn parse_decoration(raw: &str) -> Decoration {
    let mut decoration = Decoration::default();
    let inner = raw.trim().trim_start_matches('(').trim_end_matches(')');

    for label in inner.split(", ").map(str::trim).filter(|l| !l.is_empty()) {
        if let Some((_, branch)) = label.split_once(" -> ") {
            decoration.branches.push(branch.to_string());
        } else if let Some(tag) = label.strip_prefix("tag: ") {
            decoration.tags.push(tag.to_string());
        } else if is_remote_ref(label) {
            decoration.refs.push(label.to_string());
        } else {
            decoration.branches.push(label.to_string());
        }
    }

    decoration
}

fn is_remote_ref(label: &str) -> bool {
    match label.split_once('/') {
        Some((prefix, _)) => {
            !prefix.is_empty()
                && prefix.chars().all(|c| c.is_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Compact age of a commit: `42s`, `5m`, `3h`, `2D`, `7M`, `1Y`
pub fn format_age(timestamp: i64, now: i64) -> String {
    let secs = (now - timestamp).max(0);
    if secs < 60 {
        return format!("{}s", secs);
    }
    if secs < 3600 {
        return format!("{}m", secs / 60);
    }
    if secs < 86400 {
        return format!("{}h", secs / 3600);
    }
    let days = secs / 86400;
    if days < 30 {
        return format!("{}D", days);
    }
    if days < 365 {
        return format!("{}M", days / 30);
    }
    format!("{}Y", days / 365)
}

/// Current time in seconds since the unix epoch
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Shorten an author name to fit a 20-column field.
///
/// Three or more words keep the first and last word and collapse the middle
/// ones to initials; two words become `F Last`; one word is cut off.
pub fn short_author(name: &str) -> String {
    const MAX: usize = 20;
    if name.chars().count() <= MAX {
        return name.to_string();
    }

    let parts: Vec<&str> = name.split(' ').filter(|p| !p.is_empty()).collect();
    let initial = |s: &str| s.chars().next().map(String::from).unwrap_or_default();

    let short = match parts.as_slice() {
        [first, middle @ .., last] if !middle.is_empty() => {
            let initials: String = middle.iter().map(|p| initial(p)).collect();
            format!("{} {} {}", first, initials, last)
        }
        [first, last] => format!("{} {}", initial(first), last),
        _ => name.to_string(),
    };
    short.chars().take(MAX).collect()
}
