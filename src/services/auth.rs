use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::sms::SmsSender;
use super::{RequestHandler, Service, ServiceError};
use crate::models::users;
use crate::repositories::{otp::OtpRepository, users::UserRepository};
use crate::utils;

pub enum AuthRequest {
    RequestOtp {
        mobile: String,
        response: oneshot::Sender<Result<(), ServiceError>>,
    },
    VerifyOtp {
        mobile: String,
        otp: String,
        response: oneshot::Sender<Result<users::User, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct AuthRequestHandler {
    otp_repository: OtpRepository,
    user_repository: UserRepository,
    sms_sender: Arc<dyn SmsSender>,
}

impl AuthRequestHandler {
    pub fn new(
        otp_repository: OtpRepository,
        user_repository: UserRepository,
        sms_sender: Arc<dyn SmsSender>,
    ) -> Self {
        AuthRequestHandler {
            otp_repository,
            user_repository,
            sms_sender,
        }
    }

    async fn request_otp(&self, mobile: &str) -> Result<(), ServiceError> {
        utils::validate_mobile(mobile)?;

        let code = utils::generate_otp();
        let record = self.otp_repository.insert_otp(mobile, &code);
        log::debug!("Issued OTP for {} valid until {}", mobile, record.expires_at);

        self.sms_sender
            .send_otp(mobile, &code)
            .await
            .map_err(|e| ServiceError::Communication("Auth => Sms".to_string(), e.to_string()))
    }

    async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<users::User, ServiceError> {
        utils::validate_mobile(mobile)?;
        utils::validate_otp(otp)?;

        if !self.otp_repository.matches_otp(mobile, otp) {
            log::info!("Rejected OTP for {}", mobile);
            return Err(ServiceError::InvalidOrExpiredOtp);
        }

        // The code is only consumed once the user is resolved; a storage
        // failure here leaves it valid for a retry.
        let (user, created) = self.user_repository.get_or_insert_user(mobile).await?;
        if created {
            log::info!("Created user {} for {}", user.id, mobile);
        }

        if !self.otp_repository.verify_otp(mobile, otp) {
            log::info!("OTP for {} was consumed or expired concurrently", mobile);
            return Err(ServiceError::InvalidOrExpiredOtp);
        }

        Ok(user)
    }
}

#[async_trait]
impl RequestHandler<AuthRequest> for AuthRequestHandler {
    async fn handle_request(&self, request: AuthRequest) {
        match request {
            AuthRequest::RequestOtp { mobile, response } => {
                let result = self.request_otp(&mobile).await;
                let _ = response.send(result);
            }
            AuthRequest::VerifyOtp {
                mobile,
                otp,
                response,
            } => {
                let result = self.verify_otp(&mobile, &otp).await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        AuthService {}
    }
}

#[async_trait]
impl Service<AuthRequest, AuthRequestHandler> for AuthService {}
