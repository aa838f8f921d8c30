//! Lenient parsing of block arguments, which hosts pass as strings.

/// 1-based ordinal from a block argument, e.g. a person or keypoint number.
///
/// Accepts a leading integer after optional whitespace (`"2"`, `" 2"`,
/// `"2.0"`, `"2nd"` all give 2). Returns `None` when there is no leading
/// integer or it is below 1.
pub fn parse_ordinal(arg: &str) -> Option<usize> {
    let trimmed = arg.trim_start();
    let digits_end = trimmed
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '+')))
        .map_or(trimmed.len(), |(i, _)| i);
    let n: usize = trimmed[..digits_end].parse().ok()?;
    (n >= 1).then_some(n)
}

/// Finite decimal from a block argument; `None` for anything else.
pub fn parse_decimal(arg: &str) -> Option<f64> {
    arg.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
