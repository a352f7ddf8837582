//! Number formatting

/// Format `value` rounded to `digits` significant digits, with thousands
/// separators and no trailing zeros: `1234567.0` with 3 digits is
/// `"1,230,000"`, `0.012345` is `"0.0123"`.
pub fn format_significant(value: f64, digits: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 || digits == 0 {
        return "0".to_string();
    }

    let magnitude = value.abs().log10().floor() as i32 + 1;
    let decimals = (digits as i32 - magnitude).max(0) as usize;
    let scale = 10f64.powi(digits as i32 - magnitude);
    let rounded = (value * scale).round() / scale;

    let text = format!("{:.*}", decimals, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int, frac)) => (int, frac.trim_end_matches('0')),
        None => (text.as_str(), ""),
    };

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
