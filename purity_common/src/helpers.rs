/// Parses a short duration description into seconds.
///
/// Accepts a bare number of seconds, or a number followed by one of `s`, `m`, `h` or `d`, e.g. `"7d"`, `"12h"`.
/// Returns `None` for anything else, including zero and negative values.
pub fn parse_duration_secs(value: &str) -> Option<u64> {
    let value = value.trim();
    let (digits, multiplier) = match value.chars().last()? {
        's' => (&value[..value.len() - 1], 1),
        'm' => (&value[..value.len() - 1], 60),
        'h' => (&value[..value.len() - 1], 60 * 60),
        'd' => (&value[..value.len() - 1], 60 * 60 * 24),
        c if c.is_ascii_digit() => (value, 1),
        _ => return None,
    };
    let n = digits.trim().parse::<u64>().ok().filter(|n| *n > 0)?;
    n.checked_mul(multiplier)
}
