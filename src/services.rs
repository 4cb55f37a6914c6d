use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::repositories::{
    otp::OtpRepository, qr_codes::QrCodeRepository, users::UserRepository, RepositoryError,
    Store,
};
use crate::settings::Settings;
use crate::utils::FormatError;

pub mod auth;
pub mod http;
pub mod redemption;
pub mod sms;
pub mod users;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Malformed QR code: {0}")]
    MalformedQrCode(String),
    #[error("QR code not recognised")]
    UnknownQrCode,
    #[error("QR series not active")]
    InactiveQrCode,
    #[error("QR code already redeemed")]
    AlreadyRedeemed,
    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,
    #[error("User not found")]
    UnknownUser,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Communication error: {0} - {1}")]
    Communication(String, String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "ValidationError",
            ServiceError::MalformedQrCode(_) => "MalformedQRCode",
            ServiceError::UnknownQrCode => "UnknownQRCode",
            ServiceError::InactiveQrCode => "InactiveQRCode",
            ServiceError::AlreadyRedeemed => "AlreadyRedeemed",
            ServiceError::InvalidOrExpiredOtp => "InvalidOrExpiredOTP",
            ServiceError::UnknownUser => "UnknownUser",
            ServiceError::Storage(_) | ServiceError::Communication(..) => "StorageFailure",
        }
    }

    /// Only infrastructure failures are worth retrying. Nothing is retried
    /// internally; this is a hint for the caller.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Storage(_) | ServiceError::Communication(..)
        )
    }
}

impl From<FormatError> for ServiceError {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::MalformedQrCode(reason) => ServiceError::MalformedQrCode(reason.to_string()),
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Unavailable(reason) => ServiceError::Storage(reason),
            RepositoryError::UnknownQrCode => ServiceError::UnknownQrCode,
            RepositoryError::InactiveQrCode => ServiceError::InactiveQrCode,
            RepositoryError::AlreadyRedeemed => ServiceError::AlreadyRedeemed,
            RepositoryError::UnknownUser => ServiceError::UnknownUser,
            RepositoryError::MalformedQrCode(reason) => ServiceError::MalformedQrCode(reason),
            e @ RepositoryError::DuplicateQrCode(_) => ServiceError::Validation(e.to_string()),
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

/// Sends a request built around a fresh reply channel and waits for the
/// answer. A service that has gone away is reported as a communication
/// failure, never as a domain error.
pub async fn call<T, R>(
    channel: &mpsc::Sender<T>,
    service: &str,
    request: impl FnOnce(oneshot::Sender<Result<R, ServiceError>>) -> T,
) -> Result<R, ServiceError> {
    let (response_tx, response_rx) = oneshot::channel();

    channel
        .send(request(response_tx))
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?;

    response_rx
        .await
        .map_err(|e| ServiceError::Communication(service.to_string(), e.to_string()))?
}

#[derive(Clone)]
pub struct ServiceChannels {
    pub auth: mpsc::Sender<auth::AuthRequest>,
    pub users: mpsc::Sender<users::UserRequest>,
    pub redemption: mpsc::Sender<redemption::RedemptionRequest>,
}

pub fn spawn_services(
    store: Store,
    sms_sender: Arc<dyn sms::SmsSender>,
    otp_ttl: chrono::Duration,
    channel_capacity: usize,
) -> ServiceChannels {
    let (auth_tx, mut auth_rx) = mpsc::channel(channel_capacity);
    let (user_tx, mut user_rx) = mpsc::channel(channel_capacity);
    let (redemption_tx, mut redemption_rx) = mpsc::channel(channel_capacity);

    let mut auth_service = auth::AuthService::new();
    let mut user_service = users::UserService::new();
    let mut redemption_service = redemption::RedemptionService::new();

    let otp_repository = OtpRepository::new(store.clone(), otp_ttl);
    let user_repository = UserRepository::new(store.clone());
    let qr_code_repository = QrCodeRepository::new(store);

    log::info!("Starting auth service.");
    let auth_user_repository = user_repository.clone();
    tokio::spawn(async move {
        let handler =
            auth::AuthRequestHandler::new(otp_repository, auth_user_repository, sms_sender);
        auth_service.run(handler, &mut auth_rx).await;
    });

    log::info!("Starting user service.");
    tokio::spawn(async move {
        let handler = users::UserRequestHandler::new(user_repository);
        user_service.run(handler, &mut user_rx).await;
    });

    log::info!("Starting redemption service.");
    tokio::spawn(async move {
        let handler = redemption::RedemptionRequestHandler::new(qr_code_repository);
        redemption_service.run(handler, &mut redemption_rx).await;
    });

    ServiceChannels {
        auth: auth_tx,
        users: user_tx,
        redemption: redemption_tx,
    }
}

pub async fn start_services(store: Store, settings: &Settings) -> Result<(), anyhow::Error> {
    let channels = spawn_services(
        store,
        Arc::new(sms::LogSmsSender),
        chrono::Duration::seconds(settings.otp.ttl_seconds),
        settings.services.channel_capacity,
    );

    log::info!("Starting HTTP server.");
    http::start_http_server(&settings.server.listen, channels).await
}


#[cfg(test)]
mod tests {
    use futures_util::future::join_all;

    use super::testing::{Harness, CODES};
    use super::*;

    #[test]
    fn error_kinds_are_distinct_for_the_caller() {
        assert_eq!(ServiceError::AlreadyRedeemed.kind(), "AlreadyRedeemed");
        assert_eq!(ServiceError::InvalidOrExpiredOtp.kind(), "InvalidOrExpiredOTP");
        assert_eq!(ServiceError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(ServiceError::Storage("x".into()).kind(), "StorageFailure");

        assert!(ServiceError::Storage("x".into()).retryable());
        assert!(!ServiceError::AlreadyRedeemed.retryable());
        assert!(!ServiceError::InvalidOrExpiredOtp.retryable());
    }

    #[test]
    fn repository_errors_keep_their_class() {
        assert_eq!(
            ServiceError::from(RepositoryError::InactiveQrCode),
            ServiceError::InactiveQrCode
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Unavailable("timeout".into())),
            ServiceError::Storage("timeout".into())
        );
    }

    #[tokio::test]
    async fn dropped_service_is_a_communication_failure() {
        let (tx, rx) = mpsc::channel::<users::UserRequest>(1);
        drop(rx);

        let result = call(&tx, "User", |response| users::UserRequest::GetUser {
            id: "x".to_string(),
            response,
        })
        .await;
        assert!(matches!(result, Err(ServiceError::Communication(..))));
    }

    #[tokio::test]
    async fn login_then_redeem_end_to_end() {
        let harness = Harness::new().await;
        let user = harness.login("+919876543210").await;
        assert_eq!(user.total_points, 0);

        let first = harness.redeem(CODES[0], &user.id).await.unwrap();
        assert_eq!((first.points, first.total_points), (1, 1));
        let second = harness.redeem(CODES[2], &user.id).await.unwrap();
        assert_eq!((second.points, second.total_points), (10, 11));

        let user = harness.get_user(&user.id).await.unwrap();
        assert_eq!(user.total_points, 11);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn racing_redemptions_through_the_service_have_one_winner() {
        let harness = Harness::new().await;

        let mut users = Vec::new();
        for i in 0..10 {
            users.push(harness.login(&format!("+91987654320{}", i)).await);
        }

        let attempts = users.iter().map(|user| harness.redeem(CODES[1], &user.id));
        let results = join_all(attempts).await;

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let spent = results
            .iter()
            .filter(|r| **r == Err(ServiceError::AlreadyRedeemed))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(spent, users.len() - 1);

        let winner = users
            .iter()
            .zip(&results)
            .find(|(_, r)| r.is_ok())
            .map(|(user, _)| user.id.clone())
            .unwrap();
        let qr_code = harness.qr_codes.get_qr_code(CODES[1]).await.unwrap().unwrap();
        assert_eq!(qr_code.scanned_by(), Some(winner.as_str()));

        let total: u64 = {
            let mut total = 0;
            for user in &users {
                total += harness.get_user(&user.id).await.unwrap().total_points;
            }
            total
        };
        assert_eq!(total, 3);
    }
}
