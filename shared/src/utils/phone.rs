//! Phone number helpers for destinations and logs

use once_cell::sync::Lazy;
use regex::Regex;

static E164_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9]\d{1,14}$").expect("static regex"));

/// Strip formatting, keeping digits and a leading `+`
pub fn normalize_phone_number(phone: &str) -> String {
    let mut normalized = String::with_capacity(phone.len());
    for c in phone.trim().chars() {
        if c.is_ascii_digit() || (c == '+' && normalized.is_empty()) {
            normalized.push(c);
        }
    }
    normalized
}

/// Whether `phone` is already a bare E.164 number (`+` and up to 15 digits)
pub fn is_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logs, keeping only the last 4 digits
///
/// Destinations are never written to logs in clear text.
///
/// ```
/// use vk_shared::phone::mask_phone_number;
///
/// assert_eq!(mask_phone_number("+14155552671"), "+*******2671");
/// assert_eq!(mask_phone_number("555-0100"), "****0100");
/// ```
pub fn mask_phone_number(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible: String = chars[chars.len() - 4..].iter().collect();
    if chars[0] == '+' {
        format!("+{}{}", "*".repeat(chars.len() - 5), visible)
    } else {
        format!("{}{}", "*".repeat(chars.len() - 4), visible)
    }
}
