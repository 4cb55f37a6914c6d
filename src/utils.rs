use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use regex::Regex;

pub const QR_CODE_LENGTH: usize = 32;
pub const OTP_LENGTH: usize = 6;

static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+91[6-9]\d{9}$").expect("valid mobile pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid mobile number: expected +91 followed by 10 digits starting with 6-9")]
    InvalidMobile,
    #[error("OTP must be 6 digits")]
    InvalidOtp,
    #[error("Malformed QR code: {0}")]
    MalformedQrCode(&'static str),
}

/// Source of the current time. Everything that compares against an expiry
/// reads the clock through this trait so tests can move time forward.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn validate_mobile(mobile: &str) -> Result<(), FormatError> {
    if MOBILE_PATTERN.is_match(mobile) {
        Ok(())
    } else {
        Err(FormatError::InvalidMobile)
    }
}

pub fn validate_otp(code: &str) -> Result<(), FormatError> {
    if code.len() == OTP_LENGTH && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(FormatError::InvalidOtp)
    }
}

/// Six digit code drawn uniformly from 100000..=999999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn otp_expiry(issued_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    issued_at + ttl
}

/// Points carried by a QR code: the digit value of its first character plus
/// the digit value of its last character.
///
/// Codes must be exactly 32 ASCII alphanumeric characters with a decimal
/// digit at both ends. Anything else is rejected; there is no fallback
/// derivation for non-digit boundaries.
pub fn derive_qr_points(code: &str) -> Result<u32, FormatError> {
    let bytes = code.as_bytes();

    if bytes.len() != QR_CODE_LENGTH {
        return Err(FormatError::MalformedQrCode("must be 32 characters"));
    }
    if !bytes.iter().all(u8::is_ascii_alphanumeric) {
        return Err(FormatError::MalformedQrCode("must be alphanumeric"));
    }

    let first = bytes[0];
    let last = bytes[QR_CODE_LENGTH - 1];
    if !first.is_ascii_digit() || !last.is_ascii_digit() {
        return Err(FormatError::MalformedQrCode(
            "first and last characters must be digits",
        ));
    }

    Ok(u32::from(first - b'0') + u32::from(last - b'0'))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_points_from_boundary_digits() {
        assert_eq!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS7260"), Ok(1));
        assert_eq!(derive_qr_points("2BBBICP0166JM16PHE5PQNM988JS7251"), Ok(3));
        assert_eq!(derive_qr_points("5CCCICP0166JM16PHE5PQNM988JS7265"), Ok(10));
        assert_eq!(derive_qr_points(&format!("9{}9", "Z".repeat(30))), Ok(18));
    }

    #[test]
    fn rejects_malformed_codes() {
        // 31 characters
        assert!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS726").is_err());
        // 33 characters
        assert!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS72600").is_err());
        assert!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS-260").is_err());
        assert!(derive_qr_points("AAAAICP0166JM16PHE5PQNM988JS7260").is_err());
        assert!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS726A").is_err());
        assert!(derive_qr_points("").is_err());
        // multi-byte characters never count as alphanumeric here
        assert!(derive_qr_points("1AAAICP0166JM16PHE5PQNM988JS72é0").is_err());
    }

    #[test]
    fn validates_indian_mobile_numbers() {
        assert!(validate_mobile("+919876543210").is_ok());
        assert!(validate_mobile("+916000000000").is_ok());
        assert_eq!(validate_mobile("+915876543210"), Err(FormatError::InvalidMobile));
        assert_eq!(validate_mobile("9876543210"), Err(FormatError::InvalidMobile));
        assert_eq!(validate_mobile("+91987654321"), Err(FormatError::InvalidMobile));
        assert_eq!(validate_mobile("+9198765432100"), Err(FormatError::InvalidMobile));
    }

    #[test]
    fn generated_otps_are_six_digits() {
        for _ in 0..1000 {
            let code = generate_otp();
            assert!(validate_otp(&code).is_ok(), "bad code {code}");
            assert_ne!(code.as_bytes()[0], b'0');
        }
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
    }

    #[test]
    fn expiry_is_issue_time_plus_ttl() {
        let now = Utc::now();
        assert_eq!(otp_expiry(now, Duration::minutes(5)), now + Duration::seconds(300));
    }
}
