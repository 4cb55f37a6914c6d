use chrono::Duration;

use super::Store;
use crate::models::otp::OtpRecord;
use crate::utils;

/// One live OTP per mobile number. Each operation touches a single map entry,
/// so numbers never contend with each other.
#[derive(Clone)]
pub struct OtpRepository {
    store: Store,
    ttl: Duration,
}

impl OtpRepository {
    pub fn new(store: Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Stores a fresh record for `mobile`, replacing whatever was there. The
    /// previous code stops matching as soon as this returns.
    pub fn insert_otp(&self, mobile: &str, code: &str) -> OtpRecord {
        let now = self.store.now();
        let record = OtpRecord {
            mobile: mobile.to_string(),
            code: code.to_string(),
            expires_at: utils::otp_expiry(now, self.ttl),
            verified: false,
            created_at: now,
        };

        self.store
            .otps()
            .insert(mobile.to_string(), record.clone());

        record
    }

    /// True if `code` matches the active record for `mobile`. Nothing is
    /// consumed; expired records are dropped on the way out.
    pub fn matches_otp(&self, mobile: &str, code: &str) -> bool {
        let now = self.store.now();
        let otps = self.store.otps();

        let expired = match otps.get(mobile) {
            Some(record) => {
                if record.is_active(now) && record.code == code {
                    return true;
                }
                !record.verified && now > record.expires_at
            }
            None => false,
        };

        if expired {
            log::debug!("Dropping expired OTP for {}", mobile);
            otps.remove_if(mobile, |_, record| !record.is_active(now));
        }

        false
    }

    /// Consumes the active record for `mobile` if `code` matches it. The check
    /// and the mark happen under the entry lock, so a record is consumed once.
    pub fn verify_otp(&self, mobile: &str, code: &str) -> bool {
        let now = self.store.now();

        match self.store.otps().get_mut(mobile) {
            Some(mut record) if record.is_active(now) && record.code == code => {
                record.verified = true;
                true
            }
            _ => false,
        }
    }
}
