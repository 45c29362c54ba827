//! Tests for the contact directory service.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use rstest::rstest;
use tokio::sync::oneshot;

use super::*;
use crate::domain::ports::{
    FixturePasswordHasher, MailerError, MockAvatarStore, MockContactRepository,
    MockTokenService, MockVerificationMailer, TokenServiceError,
};
use crate::domain::{
    ContactProfile, ErrorCode, NewPassword, PersonName, PhoneNumber, TokenClaims,
    VerificationState,
};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 28, 12, 0, 0)
        .single()
        .expect("fixture timestamp")
}

fn email(raw: &str) -> EmailAddress {
    EmailAddress::new(raw).expect("valid email")
}

fn profile(address: &str) -> ContactProfile {
    ContactProfile {
        first_name: PersonName::new("Ada").expect("name"),
        last_name: PersonName::new("Lovelace").expect("name"),
        email: email(address),
        phone: PhoneNumber::new("0123456789").expect("phone"),
        birth_day: NaiveDate::from_ymd_opt(1815, 12, 10).expect("date"),
        data: None,
    }
}

fn contact(id: i32, address: &str, verification: VerificationState) -> Contact {
    let profile = profile(address);
    Contact {
        id: ContactId::new(id),
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        phone: profile.phone,
        birth_day: profile.birth_day,
        data: None,
        avatar_url: None,
        verification,
        created_at: fixture_now(),
        updated_at: fixture_now(),
    }
}

fn verified(id: i32, address: &str) -> Contact {
    contact(id, address, VerificationState::Verified)
}

fn pending(id: i32, address: &str, token: &str) -> Contact {
    contact(
        id,
        address,
        VerificationState::Pending(VerificationToken::new(token)),
    )
}

fn hashed(password: &str) -> crate::domain::PasswordHash {
    FixturePasswordHasher
        .hash(&NewPassword::new(password).expect("valid password"))
        .expect("hash")
}

#[derive(Default)]
struct Doubles {
    repo: MockContactRepository,
    tokens: MockTokenService,
    mailer: MockVerificationMailer,
    avatars: MockAvatarStore,
}

fn make_service(doubles: Doubles) -> ContactDirectoryService<MockContactRepository> {
    make_service_with_hasher(doubles, Arc::new(FixturePasswordHasher))
}

fn make_service_with_hasher(
    doubles: Doubles,
    hasher: Arc<dyn PasswordHasher>,
) -> ContactDirectoryService<MockContactRepository> {
    ContactDirectoryService::new(
        Arc::new(doubles.repo),
        DirectoryCollaborators {
            hasher,
            tokens: Arc::new(doubles.tokens),
            mailer: Arc::new(doubles.mailer),
            avatars: Arc::new(doubles.avatars),
            clock: Arc::new(FixtureClock {
                utc_now: fixture_now(),
            }),
        },
    )
}

fn signup_request(address: &str, password: &str) -> SignupRequest {
    SignupRequest {
        profile: profile(address),
        password: NewPassword::new(password).expect("valid password"),
    }
}

#[tokio::test]
async fn signup_creates_unverified_contact_even_when_mail_fails() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    doubles
        .repo
        .expect_create()
        .withf(|new: &NewContact| {
            new.password_hash.as_str() != "hunter2222"
                && new.avatar_url.as_deref() == Some(gravatar_url(&new.profile.email).as_str())
        })
        .times(1)
        .return_once(|_| Ok(pending(1, "ada@example.com", "tok-1")));
    let (sent_tx, sent_rx) = oneshot::channel();
    doubles
        .mailer
        .expect_send_verification()
        .withf(|mail: &VerificationEmail| mail.token.as_str() == "tok-1")
        .times(1)
        .return_once(move |_| {
            sent_tx.send(()).expect("test still listening");
            Err(MailerError::transport("smtp down"))
        });

    let service = make_service(doubles);
    let created = service
        .signup(signup_request("ada@example.com", "hunter2222"))
        .await
        .expect("signup succeeds despite mail failure");

    assert!(!created.is_verified());
    assert!(created.verification_token().is_some());
    sent_rx.await.expect("verification mail attempted");
}

#[tokio::test]
async fn signup_rejects_taken_email() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(Some(verified(1, "ada@example.com"))));

    let service = make_service(doubles);
    let err = service
        .signup(signup_request("ada@example.com", "hunter2222"))
        .await
        .expect_err("duplicate email");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.message(), CONTACT_EXISTS);
}

#[tokio::test]
async fn signup_treats_unique_violation_as_conflict() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    doubles
        .repo
        .expect_create()
        .times(1)
        .return_once(|_| Err(ContactRepositoryError::duplicate_email()));

    let service = make_service(doubles);
    let err = service
        .signup(signup_request("ada@example.com", "hunter2222"))
        .await
        .expect_err("race lost");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case::unknown_email(None, "hunter2222")]
#[case::wrong_password(Some(verified(1, "ada@example.com")), "not-the-password")]
#[case::unverified(Some(pending(1, "ada@example.com", "tok")), "hunter2222")]
#[tokio::test]
async fn login_failures_share_one_message(
    #[case] stored: Option<Contact>,
    #[case] password: &str,
) {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_credentials()
        .times(1)
        .return_once(move |_| {
            Ok(stored.map(|contact| StoredCredentials {
                contact,
                password_hash: hashed("hunter2222"),
            }))
        });

    let service = make_service(doubles);
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", password).expect("credentials");
    let err = service.login(&credentials).await.expect_err("login refused");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), BAD_CREDENTIALS);
}

#[tokio::test]
async fn login_issues_token_for_verified_account() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_credentials()
        .times(1)
        .return_once(|_| {
            Ok(Some(StoredCredentials {
                contact: verified(1, "ada@example.com"),
                password_hash: hashed("hunter2222"),
            }))
        });
    doubles
        .tokens
        .expect_issue()
        .withf(|subject: &EmailAddress| subject.as_str() == "ada@example.com")
        .times(1)
        .return_once(|_| Ok(AccessToken::new("signed.jwt.value")));

    let service = make_service(doubles);
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", "hunter2222").expect("credentials");
    let token = service.login(&credentials).await.expect("login succeeds");

    assert_eq!(token.as_str(), "signed.jwt.value");
}

/// Records which thread every hash and verify call ran on.
#[derive(Default)]
struct ThreadRecordingHasher {
    threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
}

impl ThreadRecordingHasher {
    fn record(&self) {
        self.threads
            .lock()
            .expect("threads lock")
            .push(std::thread::current().id());
    }
}

impl PasswordHasher for ThreadRecordingHasher {
    fn hash(
        &self,
        password: &NewPassword,
    ) -> Result<crate::domain::PasswordHash, crate::domain::ports::PasswordHashError> {
        self.record();
        FixturePasswordHasher.hash(password)
    }

    fn verify(&self, password: &str, hash: &crate::domain::PasswordHash) -> bool {
        self.record();
        FixturePasswordHasher.verify(password, hash)
    }
}

#[tokio::test]
async fn password_work_runs_off_the_async_executor() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(None));
    doubles
        .repo
        .expect_create()
        .times(1)
        .return_once(|_| Ok(verified(1, "ada@example.com")));
    doubles
        .repo
        .expect_find_credentials()
        .times(1)
        .return_once(|_| {
            Ok(Some(StoredCredentials {
                contact: verified(1, "ada@example.com"),
                password_hash: hashed("hunter2222"),
            }))
        });
    doubles
        .tokens
        .expect_issue()
        .times(1)
        .return_once(|_| Ok(AccessToken::new("signed.jwt.value")));
    let hasher = Arc::new(ThreadRecordingHasher::default());
    let service = make_service_with_hasher(doubles, hasher.clone());

    service
        .signup(signup_request("ada@example.com", "hunter2222"))
        .await
        .expect("signup succeeds");
    let credentials =
        LoginCredentials::try_from_parts("ada@example.com", "hunter2222").expect("credentials");
    service.login(&credentials).await.expect("login succeeds");

    let executor = std::thread::current().id();
    let threads = hasher.threads.lock().expect("threads lock");
    assert_eq!(threads.len(), 2);
    assert!(threads.iter().all(|thread| *thread != executor));
}

#[tokio::test]
async fn verify_email_rejects_unknown_token() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_verification_token()
        .times(1)
        .return_once(|_| Ok(None));

    let service = make_service(doubles);
    let err = service
        .verify_email(&VerificationToken::new("consumed"))
        .await
        .expect_err("unknown token");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), VERIFICATION_FAILED);
}

#[tokio::test]
async fn verify_email_rejects_already_verified_account() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_verification_token()
        .times(1)
        .return_once(|_| Ok(Some(verified(1, "ada@example.com"))));

    let service = make_service(doubles);
    let err = service
        .verify_email(&VerificationToken::new("tok"))
        .await
        .expect_err("already verified");

    assert_eq!(err.message(), ALREADY_VERIFIED);
}

#[tokio::test]
async fn verify_email_marks_account_verified() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_verification_token()
        .times(1)
        .return_once(|_| Ok(Some(pending(1, "ada@example.com", "tok"))));
    doubles
        .repo
        .expect_mark_verified()
        .withf(|address: &EmailAddress| address.as_str() == "ada@example.com")
        .times(1)
        .return_once(|_| Ok(Some(verified(1, "ada@example.com"))));

    let service = make_service(doubles);
    service
        .verify_email(&VerificationToken::new("tok"))
        .await
        .expect("verification succeeds");
}

#[tokio::test]
async fn authenticate_rejects_invalid_token() {
    let mut doubles = Doubles::default();
    doubles
        .tokens
        .expect_validate()
        .times(1)
        .return_once(|_| Err(TokenServiceError::expired()));

    let service = make_service(doubles);
    let err = service.authenticate("stale").await.expect_err("expired");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), INVALID_BEARER);
}

#[tokio::test]
async fn authenticate_resolves_subject_to_contact() {
    let mut doubles = Doubles::default();
    doubles.tokens.expect_validate().times(1).return_once(|_| {
        Ok(TokenClaims {
            subject: "ada@example.com".to_owned(),
            issued_at: fixture_now(),
            expires_at: fixture_now(),
        })
    });
    doubles
        .repo
        .expect_find_by_email()
        .times(1)
        .return_once(|_| Ok(Some(verified(4, "ada@example.com"))));

    let service = make_service(doubles);
    let current = service.authenticate("good").await.expect("authenticated");

    assert_eq!(current.id, ContactId::new(4));
}

#[tokio::test]
async fn update_of_another_contact_is_forbidden() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(verified(2, "bob@example.com"))));

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let err = service
        .update(&actor, ContactId::new(2), ContactPatch::default())
        .await
        .expect_err("not owner");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn update_applies_patch_to_own_record() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(verified(1, "ada@example.com"))));
    doubles
        .repo
        .expect_update()
        .withf(|id: &ContactId, patch: &ContactPatch| {
            *id == ContactId::new(1)
                && patch.phone.as_ref().map(PhoneNumber::as_str) == Some("555")
                && patch.first_name.is_none()
        })
        .times(1)
        .return_once(|_, _| {
            let mut updated = verified(1, "ada@example.com");
            updated.phone = PhoneNumber::new("555").expect("phone");
            Ok(Some(updated))
        });

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let patch = ContactPatch {
        phone: Some(PhoneNumber::new("555").expect("phone")),
        ..ContactPatch::default()
    };
    let updated = service
        .update(&actor, ContactId::new(1), patch)
        .await
        .expect("update succeeds");

    assert_eq!(updated.phone.as_str(), "555");
}

#[tokio::test]
async fn delete_of_missing_contact_is_not_found() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(None));

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let err = service
        .delete(&actor, ContactId::new(99))
        .await
        .expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(err.message(), CONTACT_NOT_FOUND);
}

#[tokio::test]
async fn delete_of_another_contact_is_forbidden() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Ok(Some(verified(2, "bob@example.com"))));

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let err = service
        .delete(&actor, ContactId::new(2))
        .await
        .expect_err("not owner");

    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn upcoming_birthdays_use_clock_date() {
    let mut doubles = Doubles::default();
    doubles
        .repo
        .expect_birthdays_within()
        .withf(|window: &BirthdayWindow| {
            window.start() == NaiveDate::from_ymd_opt(2024, 1, 28).expect("date")
                && window.days() == 7
        })
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let service = make_service(doubles);
    let found = service.upcoming_birthdays(7).await.expect("query succeeds");

    assert!(found.is_empty());
}

#[tokio::test]
async fn upcoming_birthdays_reject_oversized_window() {
    let service = make_service(Doubles::default());
    let err = service
        .upcoming_birthdays(400)
        .await
        .expect_err("window too wide");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(AvatarStoreError::unconfigured(), ErrorCode::ServiceUnavailable)]
#[case(AvatarStoreError::rejected("bad image"), ErrorCode::InvalidRequest)]
#[case(AvatarStoreError::transport("timeout"), ErrorCode::ServiceUnavailable)]
#[tokio::test]
async fn avatar_failures_map_to_error_codes(
    #[case] failure: AvatarStoreError,
    #[case] expected: ErrorCode,
) {
    let mut doubles = Doubles::default();
    doubles
        .avatars
        .expect_upload()
        .times(1)
        .return_once(move |_| Err(failure));

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let err = service
        .upload_avatar(&actor, "image/png".to_owned(), vec![1, 2, 3])
        .await
        .expect_err("upload fails");

    assert_eq!(err.code(), expected);
}

#[tokio::test]
async fn avatar_upload_persists_returned_url() {
    let mut doubles = Doubles::default();
    doubles
        .avatars
        .expect_upload()
        .withf(|upload: &AvatarUpload| upload.contact_id == ContactId::new(1))
        .times(1)
        .return_once(|_| Ok("https://img.example/1.png".to_owned()));
    doubles
        .repo
        .expect_set_avatar()
        .withf(|id: &ContactId, url: &str| {
            *id == ContactId::new(1) && url == "https://img.example/1.png"
        })
        .times(1)
        .return_once(|_, url| {
            let mut updated = verified(1, "ada@example.com");
            updated.avatar_url = Some(url.to_owned());
            Ok(Some(updated))
        });

    let service = make_service(doubles);
    let actor = verified(1, "ada@example.com");
    let updated = service
        .upload_avatar(&actor, "image/png".to_owned(), vec![1, 2, 3])
        .await
        .expect("upload succeeds");

    assert_eq!(updated.avatar_url.as_deref(), Some("https://img.example/1.png"));
}
