//! Game clock normalization.
//!
//! The upstream feed reports the period clock in several shapes depending on the endpoint and
//! the moment in the game (`PT09M47.00S`, `5:06`, `12.3`, blanks). Everything downstream compares
//! clocks through [`to_seconds`], and everything sent to clients goes through [`normalize`] so
//! subscribers only ever see the canonical `PT{MM}M{SS.ss}S` form.

/// Upper bound for a plausible period clock. Anything larger is treated as corrupt.
const MAX_CLOCK_SECS: f64 = 3_600.0;

/// Convert any supported clock representation into the canonical duration string.
///
/// Returns `None` for missing, blank or unparseable input.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    let seconds = to_seconds(raw)?;
    let hundredths = (seconds * 100.0).round() as u64;
    let minutes = hundredths / 6_000;
    let remainder = hundredths % 6_000;
    Some(format!(
        "PT{minutes:02}M{:02}.{:02}S",
        remainder / 100,
        remainder % 100
    ))
}

/// Seconds remaining in the period for a canonical (or near-canonical) clock string.
///
/// Never panics; anything that cannot be read as a clock yields `None`.
pub fn to_seconds(clock: Option<&str>) -> Option<f64> {
    let trimmed = clock?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_ascii_uppercase();
    let seconds = if let Some(body) = upper.strip_prefix("PT") {
        parse_iso_duration(body)?
    } else if let Some((minutes, seconds)) = trimmed.split_once(':') {
        parse_colon_clock(minutes, seconds)?
    } else {
        trimmed.parse::<f64>().ok()?
    };

    (seconds.is_finite() && (0.0..=MAX_CLOCK_SECS).contains(&seconds)).then_some(seconds)
}

/// Parse the part of an ISO-8601 duration after the `PT` designator (`09M47.00S`, `12M`).
fn parse_iso_duration(body: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut start = 0;
    let mut last_rank = 0u8;

    for (idx, ch) in body.char_indices() {
        let (rank, scale) = match ch {
            'H' => (1, 3_600.0),
            'M' => (2, 60.0),
            'S' => (3, 1.0),
            _ => continue,
        };
        // Units must appear at most once and in H, M, S order.
        if rank <= last_rank {
            return None;
        }
        let value = parse_component(&body[start..idx])?;
        total += value * scale;
        last_rank = rank;
        start = idx + ch.len_utf8();
    }

    if last_rank == 0 || start != body.len() {
        return None;
    }
    Some(total)
}

/// Parse a `M:SS` or `M:SS.s` clock.
fn parse_colon_clock(minutes: &str, seconds: &str) -> Option<f64> {
    let minutes = minutes.trim().parse::<u32>().ok()?;
    let seconds = parse_component(seconds.trim())?;
    if seconds >= 60.0 {
        return None;
    }
    Some(f64::from(minutes) * 60.0 + seconds)
}

fn parse_component(text: &str) -> Option<f64> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    text.parse::<f64>().ok()
}
