use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::models::{otp::OtpRecord, qr_codes::QrCode, users::User};
use crate::utils::{Clock, SystemClock};

pub mod otp;
pub mod qr_codes;
pub mod users;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("QR code was never issued")]
    UnknownQrCode,
    #[error("QR code is not active")]
    InactiveQrCode,
    #[error("QR code already redeemed")]
    AlreadyRedeemed,
    #[error("User not found")]
    UnknownUser,
    #[error("QR code {0} already issued")]
    DuplicateQrCode(String),
    #[error("Malformed QR code: {0}")]
    MalformedQrCode(String),
}

/// Users, the mobile index and the QR catalog. They live behind a single lock
/// so a redemption can mark a code and credit a balance in one step.
#[derive(Default)]
pub struct Tables {
    pub users: HashMap<String, User>,
    pub users_by_mobile: HashMap<String, String>,
    pub qr_codes: HashMap<String, QrCode>,
}

/// Process-wide storage handle. Cloning is cheap; every clone points at the
/// same tables.
#[derive(Clone)]
pub struct Store {
    tables: Arc<RwLock<Tables>>,
    otps: Arc<DashMap<String, OtpRecord>>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl Store {
    pub fn new(lock_timeout: Duration) -> Self {
        Self::with_clock(lock_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(lock_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            otps: Arc::new(DashMap::new()),
            clock,
            lock_timeout,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn otps(&self) -> &DashMap<String, OtpRecord> {
        &self.otps
    }

    pub(crate) async fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        tokio::time::timeout(self.lock_timeout, self.tables.read())
            .await
            .map_err(|_| {
                log::error!("Timed out after {:?} waiting for store read lock", self.lock_timeout);
                RepositoryError::Unavailable("timed out acquiring read lock".to_string())
            })
    }

    pub(crate) async fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        tokio::time::timeout(self.lock_timeout, self.tables.write())
            .await
            .map_err(|_| {
                log::error!("Timed out after {:?} waiting for store write lock", self.lock_timeout);
                RepositoryError::Unavailable("timed out acquiring write lock".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lock_timeout_surfaces_as_unavailable() {
        let store = Store::new(Duration::from_millis(20));
        let _held = store.write().await.unwrap();

        let other = store.clone();
        let result = other.read().await;
        match result {
            Err(RepositoryError::Unavailable(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("read lock acquired while write lock held"),
        }
    }
}
