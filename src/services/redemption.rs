use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::qr_codes::Redemption;
use crate::repositories::qr_codes::QrCodeRepository;
use crate::utils;

pub enum RedemptionRequest {
    ValidateAndRedeem {
        qr_code: String,
        user_id: String,
        response: oneshot::Sender<Result<Redemption, ServiceError>>,
    },
    PreviewPoints {
        qr_code: String,
        response: oneshot::Sender<Result<u32, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct RedemptionRequestHandler {
    repository: QrCodeRepository,
}

impl RedemptionRequestHandler {
    pub fn new(repository: QrCodeRepository) -> Self {
        RedemptionRequestHandler { repository }
    }

    async fn validate_and_redeem(
        &self,
        qr_code: &str,
        user_id: &str,
    ) -> Result<Redemption, ServiceError> {
        // Format is checked before the store is touched.
        utils::derive_qr_points(qr_code)?;

        match self.repository.redeem_qr_code(qr_code, user_id).await {
            Ok(redemption) => {
                log::info!(
                    "Redeemed {} for user {}: +{} points, total {}",
                    qr_code,
                    user_id,
                    redemption.points,
                    redemption.total_points
                );
                Ok(redemption)
            }
            Err(e) => {
                log::warn!("Rejected redemption of {} by {}: {}", qr_code, user_id, e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl RequestHandler<RedemptionRequest> for RedemptionRequestHandler {
    async fn handle_request(&self, request: RedemptionRequest) {
        match request {
            RedemptionRequest::ValidateAndRedeem {
                qr_code,
                user_id,
                response,
            } => {
                let result = self.validate_and_redeem(&qr_code, &user_id).await;
                let _ = response.send(result);
            }
            RedemptionRequest::PreviewPoints { qr_code, response } => {
                let points = utils::derive_qr_points(&qr_code).map_err(ServiceError::from);
                let _ = response.send(points);
            }
        }
    }
}

pub struct RedemptionService;

impl RedemptionService {
    pub fn new() -> Self {
        RedemptionService {}
    }
}

#[async_trait]
impl Service<RedemptionRequest, RedemptionRequestHandler> for RedemptionService {}
