//! Sorted-set score text codec
//!
//! Scores are stored as decimal text with 17 significant digits, the C
//! `%.17g` rendering, which round-trips every finite `f64` exactly. The exact
//! bytes matter: stores written by other implementations use the same text.

/// Significant digits used for stored scores
pub const SCORE_PRECISION: usize = 17;

/// Render a score the way `printf("%.17g")` does
pub fn format_score(score: f64) -> String {
    if score.is_nan() {
        return "nan".to_string();
    }
    if score.is_infinite() {
        return if score > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if score == 0.0 {
        return if score.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent of the rounded scientific form decides between the fixed
    // and exponential notations.
    let scientific = format!("{:.*e}", SCORE_PRECISION - 1, score);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = match exponent.parse() {
        Ok(exp) => exp,
        Err(_) => return scientific,
    };

    if exponent < -4 || exponent >= SCORE_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (SCORE_PRECISION as i32 - 1 - exponent) as usize;
        let fixed = format!("{:.*}", decimals, score);
        trim_fraction(&fixed).to_string()
    }
}

/// Parse a stored or client-supplied score
///
/// Accepts everything [`format_score`] emits plus the usual decimal forms
/// (`+1.5`, `1e3`, `-inf`). Returns `None` for anything else.
pub fn parse_score(text: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(text).ok()?;
    if text.is_empty() || text.trim() != text {
        return None;
    }
    text.parse::<f64>().ok()
}

/// `%g` drops trailing zeros of the fraction, and the point if nothing is left
fn trim_fraction(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}
