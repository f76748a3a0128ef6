use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};

use super::*;
use crate::storage::MemoryStorage;

const PHONE: &str = "0711000000";

struct FixedCode(&'static str);

impl CodeGenerator for FixedCode {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

#[derive(Default)]
struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsGateway for RecordingSms {
    async fn send(&self, phone_number: &str, message: &str) -> Result<(), SmsError> {
        self.sent
            .lock()
            .expect("sms mutex poisoned")
            .push((phone_number.to_string(), message.to_string()));
        Ok(())
    }
}

struct BrokenSms;

#[async_trait]
impl SmsGateway for BrokenSms {
    async fn send(&self, _phone_number: &str, _message: &str) -> Result<(), SmsError> {
        Err(SmsError::Delivery("gateway timeout".to_string()))
    }
}

fn service(sms: Arc<dyn SmsGateway>) -> (Arc<MemoryStorage>, OtpService<MemoryStorage>) {
    let store = Arc::new(MemoryStorage::new());
    let service = OtpService::with_codes(
        Arc::clone(&store),
        sms,
        Arc::new(FixedCode("123456")),
        OtpPolicy::default(),
    );
    (store, service)
}

fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn issued_code_verifies_once_before_expiry() {
    let (_, otp) = service(Arc::new(RecordingSms::default()));
    let expires_at = otp.issue_at(PHONE, issued_at()).await.expect("issued");
    assert_eq!(expires_at, issued_at() + Duration::minutes(5));

    let within_window = issued_at() + Duration::minutes(4);
    assert!(otp
        .verify_at(PHONE, "123456", within_window)
        .await
        .expect("verify"));
    assert!(!otp
        .verify_at(PHONE, "123456", within_window)
        .await
        .expect("second verify"));
    assert!(otp.is_verified(PHONE).await.expect("lookup"));
}

#[tokio::test]
async fn expired_code_is_refused() {
    let (_, otp) = service(Arc::new(RecordingSms::default()));
    otp.issue_at(PHONE, issued_at()).await.expect("issued");

    let late = issued_at() + Duration::minutes(5) + Duration::seconds(1);
    assert!(!otp.verify_at(PHONE, "123456", late).await.expect("verify"));
    assert!(!otp.is_verified(PHONE).await.expect("lookup"));
}

#[tokio::test]
async fn three_wrong_guesses_lock_the_code() {
    let (store, otp) = service(Arc::new(RecordingSms::default()));
    otp.issue_at(PHONE, issued_at()).await.expect("issued");
    let now = issued_at() + Duration::minutes(1);

    for guess in ["000000", "111111", "222222"] {
        assert!(!otp.verify_at(PHONE, guess, now).await.expect("verify"));
    }
    let record = store
        .latest_unverified_otp(PHONE)
        .await
        .expect("read")
        .expect("still live");
    assert_eq!(record.attempts, 3);

    assert!(!otp.verify_at(PHONE, "123456", now).await.expect("verify"));
}

#[tokio::test]
async fn right_code_after_two_misses_still_verifies() {
    let (_, otp) = service(Arc::new(RecordingSms::default()));
    otp.issue_at(PHONE, issued_at()).await.expect("issued");
    let now = issued_at() + Duration::minutes(1);

    assert!(!otp.verify_at(PHONE, "999999", now).await.expect("miss"));
    assert!(!otp.verify_at(PHONE, "888888", now).await.expect("miss"));
    assert!(otp.verify_at(PHONE, "123456", now).await.expect("hit"));
}

#[tokio::test]
async fn unknown_phone_never_verifies() {
    let (_, otp) = service(Arc::new(RecordingSms::default()));
    assert!(!otp
        .verify_at("0722000000", "123456", issued_at())
        .await
        .expect("verify"));
}

#[tokio::test]
async fn sms_carries_code_and_validity() {
    let sms = Arc::new(RecordingSms::default());
    let (_, otp) = service(sms.clone());
    otp.issue_at(PHONE, issued_at()).await.expect("issued");

    let sent = sms.sent.lock().expect("sms mutex poisoned");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, PHONE);
    assert!(sent[0].1.contains("123456"));
    assert!(sent[0].1.contains("5 minutes"));
}

#[tokio::test]
async fn delivery_failure_does_not_fail_issue() {
    let (_, otp) = service(Arc::new(BrokenSms));
    otp.issue_at(PHONE, issued_at())
        .await
        .expect("issue succeeds despite gateway failure");
    assert!(otp
        .verify_at(PHONE, "123456", issued_at())
        .await
        .expect("verify"));
}

#[tokio::test]
async fn blank_phone_is_rejected() {
    let (_, otp) = service(Arc::new(RecordingSms::default()));
    let err = otp.issue_at("   ", issued_at()).await.expect_err("blank");
    assert!(matches!(err, OtpError::MissingPhoneNumber));
}

#[tokio::test]
async fn cleanup_removes_only_expired_codes() {
    let (store, otp) = service(Arc::new(RecordingSms::default()));
    otp.issue_at(PHONE, issued_at()).await.expect("issued");
    otp.issue_at("0722000000", issued_at() + Duration::minutes(10))
        .await
        .expect("issued");

    let removed = otp
        .cleanup_expired_at(issued_at() + Duration::minutes(6))
        .await
        .expect("cleanup");
    assert_eq!(removed, 1);
    assert!(store
        .latest_unverified_otp(PHONE)
        .await
        .expect("read")
        .is_none());
}

#[test]
fn random_codes_are_six_digits() {
    for _ in 0..64 {
        let code = RandomCodes.generate();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}
