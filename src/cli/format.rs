//! Output formatting for CLI display.

use jiff::SignedDuration;

/// `2 days, 3:05:00`: whole days, then hours, minutes and seconds.
pub(super) fn format_duration(duration: SignedDuration) -> String {
    let secs = duration.as_secs().max(0);
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (h, m, s) = (rest / 3600, rest % 3600 / 60, rest % 60);
    let unit = if days == 1 { "day" } else { "days" };
    format!("{days} {unit}, {h}:{m:02}:{s:02}")
}

/// `US$ 1,234,567`.
pub(super) fn format_cost(usd: u64) -> String {
    let digits = usd.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("US$ {out}")
}
