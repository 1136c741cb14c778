use bigdecimal::BigDecimal;
use std::fmt;
use std::str::FromStr;

pub const ORDER_ID_MAX_LEN: usize = 255;
pub const PROVIDER_STATUS_MAX_LEN: usize = 32;
pub const AMOUNT_MAX_INTEGER_DIGITS: usize = 12;
pub const AMOUNT_MAX_SCALE: usize = 2;
pub const RETURN_LOCATION_MAX_LEN: usize = 512;
pub const NOTES_MAX_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Order ids come back through the browser, so only a conservative
/// character set is accepted.
pub fn validate_order_id(order_id: &str) -> ValidationResult {
    validate_required("orderId", order_id)?;
    validate_max_len("orderId", order_id, ORDER_ID_MAX_LEN)?;

    if !order_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
    {
        return Err(ValidationError::new(
            "orderId",
            "must contain only letters, digits, '-', '_', '.' or ':'",
        ));
    }

    Ok(())
}

/// Gateway amounts are plain decimals: digits, then at most
/// `AMOUNT_MAX_SCALE` fractional digits. Signs and exponents are rejected,
/// since an exponent lets a short input expand into an enormous number.
pub fn parse_amount(raw: &str) -> Result<BigDecimal, ValidationError> {
    let raw = raw.trim();
    validate_required("amount", raw)?;

    let (integer, fraction) = match raw.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (raw, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(integer) || !fraction.map_or(true, all_digits) {
        return Err(ValidationError::new(
            "amount",
            "must be a non-negative decimal number like 967.60",
        ));
    }

    if integer.len() > AMOUNT_MAX_INTEGER_DIGITS {
        return Err(ValidationError::new(
            "amount",
            format!("must have at most {} integer digits", AMOUNT_MAX_INTEGER_DIGITS),
        ));
    }

    if fraction.map_or(0, str::len) > AMOUNT_MAX_SCALE {
        return Err(ValidationError::new(
            "amount",
            format!("must have at most {} decimal places", AMOUNT_MAX_SCALE),
        ));
    }

    BigDecimal::from_str(raw).map_err(|_| ValidationError::new("amount", "must be a decimal number"))
}

/// Return locations become redirect targets, so only same-site paths are
/// kept: a single leading `/`, no scheme or host, no backslashes.
pub fn validate_return_location(location: &str) -> ValidationResult {
    validate_required("returnTo", location)?;
    validate_max_len("returnTo", location, RETURN_LOCATION_MAX_LEN)?;

    let same_site = location.starts_with('/')
        && !location.starts_with("//")
        && !location.contains('\\')
        && !location.chars().any(char::is_control);
    if !same_site {
        return Err(ValidationError::new("returnTo", "must be a path on this site"));
    }

    Ok(())
}

/// Free-text guest notes: control characters stripped, whitespace
/// collapsed, cut to `NOTES_MAX_LEN` characters. Empty notes become `None`.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    let cleaned = sanitize_string(notes?);
    if cleaned.is_empty() {
        return None;
    }
    Some(cleaned.chars().take(NOTES_MAX_LEN).collect())
}
