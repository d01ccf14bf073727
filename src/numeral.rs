//! Roman-numeral text codec.
//!
//! Numerals are written in canonical subtractive form (`IV`, not `IIII`).
//! A fractional numeral is two numerals joined by a dot, the second one
//! spelling the decimal digits: `I.V` is 1.5 and `II.XXV` is 2.25.

/// Value/letter pairs, largest first.
const LOOKUP: [(u64, &str); 13] = [
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Largest value a canonical numeral can spell.
pub const MAX_NUMERAL: u64 = 3999;

/// Magnitudes above this print as plain decimals instead of a run of `M`s.
pub const MAX_SPELLED: f64 = 1_000_000.0;

/// Letters that may start or continue a numeral.
pub fn is_numeral_char(ch: char) -> bool {
    matches!(ch, 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M')
}

fn letter_value(ch: char) -> Option<u64> {
    Some(match ch {
        'I' => 1,
        'V' => 5,
        'X' => 10,
        'L' => 50,
        'C' => 100,
        'D' => 500,
        'M' => 1000,
        _ => return None,
    })
}

/// Spells a non-negative integer. Zero spells as the empty string.
pub fn encode_integer(mut number: u64) -> String {
    let mut out = String::new();
    for (value, letters) in LOOKUP {
        out.push_str(&letters.repeat((number / value) as usize));
        number %= value;
    }
    out
}

/// Reads a canonical numeral in `1..=3999`.
pub fn decode_integer(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    let digits = text
        .chars()
        .map(letter_value)
        .collect::<Option<Vec<u64>>>()?;

    let mut total = 0;
    for (i, &digit) in digits.iter().enumerate() {
        match digits.get(i + 1) {
            Some(&next) if next > digit => total -= digit as i64,
            _ => total += digit as i64,
        }
    }
    if total < 1 || total as u64 > MAX_NUMERAL {
        return None;
    }

    // Non-canonical spellings (IIII, VX, IC) do not survive a re-encode.
    let total = total as u64;
    (encode_integer(total) == text).then_some(total)
}

/// Reads a numeral with an optional `.fraction` part.
pub fn decode(text: &str) -> Option<f64> {
    match text.split_once('.') {
        None => decode_integer(text).map(|n| n as f64),
        Some((whole, fraction)) => {
            let whole = decode_integer(whole)?;
            let fraction = decode_integer(fraction)?;
            format!("{whole}.{fraction}").parse().ok()
        }
    }
}

/// Spells a number: `nil` for zero, a leading `-` for negatives,
/// and at most three decimal digits. Non-finite values and magnitudes
/// past [`MAX_SPELLED`] fall back to decimal text.
pub fn encode(value: f64) -> String {
    if !value.is_finite() || value.abs() > MAX_SPELLED {
        return format!("{value}");
    }
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        return "nil".to_string();
    }
    if rounded < 0.0 {
        return format!("-{}", encode(-rounded));
    }
    if rounded.fract() == 0.0 {
        return encode_integer(rounded as u64);
    }

    let text = format!("{rounded:.3}");
    let text = text.trim_end_matches('0');
    match text.split_once('.') {
        Some((whole, fraction)) => {
            let whole = whole.parse::<u64>().unwrap_or(0);
            let fraction = fraction.parse::<u64>().unwrap_or(0);
            format!("{}.{}", encode_integer(whole), encode_integer(fraction))
        }
        None => encode_integer(rounded as u64),
    }
}
