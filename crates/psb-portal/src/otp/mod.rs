//! One-time passcodes for phone verification.
//!
//! Only the newest code per phone number is live. A code is accepted while it is unexpired,
//! unverified, and has seen fewer than `max_attempts` wrong guesses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{info, warn};

use crate::config::OtpConfig;
use crate::schema::NewOtp;
use crate::storage::{OtpStore, StoreError};

/// Source of six-digit codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodes;

impl CodeGenerator for RandomCodes {
    fn generate(&self) -> String {
        rand::rng().random_range(100_000..=999_999).to_string()
    }
}

/// Outbound SMS transport.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), SmsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("sms delivery failed: {0}")]
    Delivery(String),
}

/// Development transport: writes the message to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSmsGateway;

#[async_trait]
impl SmsGateway for LogSmsGateway {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), SmsError> {
        info!(phone_number, message, "sms dispatched to log gateway");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub ttl: Duration,
    pub max_attempts: i32,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            max_attempts: 3,
        }
    }
}

impl From<OtpConfig> for OtpPolicy {
    fn from(config: OtpConfig) -> Self {
        Self {
            ttl: Duration::seconds(config.ttl_seconds),
            max_attempts: config.max_attempts,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Phone number is required")]
    MissingPhoneNumber,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct OtpService<S: ?Sized> {
    store: Arc<S>,
    sms: Arc<dyn SmsGateway>,
    codes: Arc<dyn CodeGenerator>,
    policy: OtpPolicy,
}

impl<S: ?Sized> Clone for OtpService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sms: Arc::clone(&self.sms),
            codes: Arc::clone(&self.codes),
            policy: self.policy,
        }
    }
}

impl<S> OtpService<S>
where
    S: OtpStore + ?Sized,
{
    pub fn new(store: Arc<S>, sms: Arc<dyn SmsGateway>, policy: OtpPolicy) -> Self {
        Self::with_codes(store, sms, Arc::new(RandomCodes), policy)
    }

    pub fn with_codes(
        store: Arc<S>,
        sms: Arc<dyn SmsGateway>,
        codes: Arc<dyn CodeGenerator>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            store,
            sms,
            codes,
            policy,
        }
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    pub async fn issue(&self, phone_number: &str) -> Result<DateTime<Utc>, OtpError> {
        self.issue_at(phone_number, Utc::now()).await
    }

    /// Replace any earlier code for the phone and send the new one. Returns the expiry.
    ///
    /// SMS failures are logged and swallowed; the stored code stays valid.
    pub async fn issue_at(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, OtpError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(OtpError::MissingPhoneNumber);
        }

        let code = self.codes.generate();
        let stored = self
            .store
            .replace_otp(NewOtp {
                phone_number: phone_number.to_string(),
                otp: code.clone(),
                expires_at: now + self.policy.ttl,
            })
            .await?;

        let message = format!(
            "Your verification code is: {code}. Valid for {} minutes.",
            self.policy.ttl.num_minutes()
        );
        if let Err(err) = self.sms.send(phone_number, &message).await {
            warn!(error = %err, phone_number, "otp sms delivery failed");
        }

        Ok(stored.expires_at)
    }

    pub async fn verify(&self, phone_number: &str, code: &str) -> Result<bool, OtpError> {
        self.verify_at(phone_number, code, Utc::now()).await
    }

    /// A wrong guess burns one attempt. The right code does not count as an attempt.
    pub async fn verify_at(
        &self,
        phone_number: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, OtpError> {
        let Some(record) = self
            .store
            .latest_unverified_otp(phone_number.trim())
            .await?
        else {
            return Ok(false);
        };

        if record.expires_at < now || record.attempts >= self.policy.max_attempts {
            return Ok(false);
        }

        if record.otp != code.trim() {
            self.store.record_failed_attempt(record.id).await?;
            return Ok(false);
        }

        self.store.mark_otp_verified(record.id).await?;
        Ok(true)
    }

    pub async fn is_verified(&self, phone_number: &str) -> Result<bool, OtpError> {
        Ok(self.store.has_verified_otp(phone_number.trim()).await?)
    }

    pub async fn cleanup_expired(&self) -> Result<u64, OtpError> {
        self.cleanup_expired_at(Utc::now()).await
    }

    pub async fn cleanup_expired_at(&self, now: DateTime<Utc>) -> Result<u64, OtpError> {
        let removed = self.store.delete_expired_otps(now).await?;
        info!(removed, "expired otp records deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests;
