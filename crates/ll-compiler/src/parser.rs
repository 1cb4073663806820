use ll_core::DomainToken;

/// Line counts from one parse, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub blank: usize,
    pub comments: usize,
    pub exceptions: usize,
    pub cosmetic: usize,
    pub domains: usize,
    pub dropped: usize,
}

/// Extract the domains of `||domain^` rules, in list order.
///
/// Duplicates are kept. Lines that are not plain host-anchored rules are
/// skipped silently.
pub fn parse_filter_list(text: &str) -> Vec<DomainToken> {
    parse_filter_list_with_stats(text).0
}

pub fn parse_filter_list_with_stats(text: &str) -> (Vec<DomainToken>, ParseStats) {
    let mut domains = Vec::new();
    let mut stats = ParseStats::default();

    for raw_line in text.lines() {
        stats.lines += 1;
        let line = raw_line.trim();

        if line.is_empty() {
            stats.blank += 1;
            continue;
        }
        if is_comment_line(line) {
            stats.comments += 1;
            continue;
        }
        if is_exception_line(line) {
            stats.exceptions += 1;
            continue;
        }
        if is_cosmetic_line(line) {
            stats.cosmetic += 1;
            continue;
        }

        match parse_host_anchor_rule(line) {
            Some(domain) => domains.push(domain),
            None => stats.dropped += 1,
        }
    }

    stats.domains = domains.len();
    log::debug!(
        "parsed {} lines: {} domains, {} dropped",
        stats.lines,
        stats.domains,
        stats.dropped
    );

    (domains, stats)
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!')
}

fn is_exception_line(line: &str) -> bool {
    line.starts_with("@@")
}

fn is_cosmetic_line(line: &str) -> bool {
    line.contains("##") || line.contains("#@#")
}

/// Match `||<host>^`, where the host is at least one character and holds no
/// `/` or `^`. Anything after the closing `^` (options like `$third-party`)
/// is ignored.
fn parse_host_anchor_rule(line: &str) -> Option<DomainToken> {
    let rest = line.strip_prefix("||")?;

    for (i, ch) in rest.char_indices() {
        match ch {
            '^' => return DomainToken::new(&rest[..i]),
            '/' => return None,
            _ => {}
        }
    }

    None
}
