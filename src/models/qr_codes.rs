use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who spent a code and when. Both halves are recorded together, once.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Scan {
    pub user_id: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub code: String,
    pub points: u32,
    pub is_active: bool,
    scan: Option<Scan>,
    pub created_at: DateTime<Utc>,
}

impl QrCode {
    pub fn new(code: String, points: u32, is_active: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            code,
            points,
            is_active,
            scan: None,
            created_at,
        }
    }

    pub fn scanned_by(&self) -> Option<&str> {
        self.scan.as_ref().map(|scan| scan.user_id.as_str())
    }

    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        self.scan.as_ref().map(|scan| scan.scanned_at)
    }

    pub fn is_spent(&self) -> bool {
        self.scan.is_some()
    }

    /// One-way transition. Returns false, leaving the record untouched, if the
    /// code was already spent.
    pub fn mark_scanned(&mut self, user_id: &str, at: DateTime<Utc>) -> bool {
        if self.scan.is_some() {
            return false;
        }

        self.scan = Some(Scan {
            user_id: user_id.to_string(),
            scanned_at: at,
        });
        true
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRedemption {
    pub qr_code: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub points: u32,
    pub total_points: u64,
}
