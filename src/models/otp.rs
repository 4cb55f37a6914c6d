use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub mobile: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Unverified and not yet past its expiry. Only active records can be matched.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.verified && now <= self.expires_at
    }
}
