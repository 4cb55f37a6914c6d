use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub mobile: String,
    pub total_points: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OtpRequest {
    pub mobile: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OtpVerification {
    pub mobile: String,
    pub otp: String,
}
