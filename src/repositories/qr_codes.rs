use super::{RepositoryError, Store, Tables};
use crate::models::qr_codes::{QrCode, Redemption};
use crate::utils;

#[derive(Clone)]
pub struct QrCodeRepository {
    store: Store,
}

impl QrCodeRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Adds a code to the catalog. Administrative only; redemptions never
    /// create codes.
    pub async fn insert_qr_code(
        &self,
        code: &str,
        is_active: bool,
    ) -> Result<QrCode, RepositoryError> {
        let points = utils::derive_qr_points(code)
            .map_err(|e| RepositoryError::MalformedQrCode(e.to_string()))?;

        let mut tables = self.store.write().await?;
        if tables.qr_codes.contains_key(code) {
            return Err(RepositoryError::DuplicateQrCode(code.to_string()));
        }

        let qr_code = QrCode::new(code.to_string(), points, is_active, self.store.now());
        tables.qr_codes.insert(code.to_string(), qr_code.clone());

        Ok(qr_code)
    }

    pub async fn get_qr_code(&self, code: &str) -> Result<Option<QrCode>, RepositoryError> {
        let tables = self.store.read().await?;

        Ok(tables.qr_codes.get(code).cloned())
    }

    /// Spends `code` on behalf of `user_id` and credits its points.
    ///
    /// The whole check-then-set runs under the store's write lock: exactly one
    /// caller can observe the code unspent, and the scan record and the
    /// balance increment become visible together or not at all.
    pub async fn redeem_qr_code(
        &self,
        code: &str,
        user_id: &str,
    ) -> Result<Redemption, RepositoryError> {
        let mut guard = self.store.write().await?;
        let Tables {
            users, qr_codes, ..
        } = &mut *guard;

        let qr_code = qr_codes
            .get_mut(code)
            .ok_or(RepositoryError::UnknownQrCode)?;

        if !qr_code.is_active {
            return Err(RepositoryError::InactiveQrCode);
        }
        if qr_code.is_spent() {
            return Err(RepositoryError::AlreadyRedeemed);
        }

        let user = users.get_mut(user_id).ok_or(RepositoryError::UnknownUser)?;

        if !qr_code.mark_scanned(user_id, self.store.now()) {
            return Err(RepositoryError::AlreadyRedeemed);
        }
        user.total_points += u64::from(qr_code.points);

        Ok(Redemption {
            points: qr_code.points,
            total_points: user.total_points,
        })
    }
}
