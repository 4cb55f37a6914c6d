use async_trait::async_trait;

/// Delivery of one-time passcodes to a handset.
#[async_trait]
pub trait SmsSender: Send + Sync + 'static {
    async fn send_otp(&self, mobile: &str, code: &str) -> Result<(), anyhow::Error>;
}

/// Stand-in for a real SMS gateway: the code only goes to the log.
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_otp(&self, mobile: &str, code: &str) -> Result<(), anyhow::Error> {
        log::info!("OTP for {}: {}", mobile, code);
        Ok(())
    }
}
