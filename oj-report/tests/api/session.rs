use crate::helpers::{CSRF_TOKEN, TestSite, failure, ok};
use claims::{assert_err, assert_matches, assert_ok};
use oj_report::domain::{Credentials, UserName};
use oj_report::session::{LoginError, OjSession};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials {
        username: UserName::parse("admin".into()).unwrap(),
        password: SecretString::from("rootroot"),
    }
}

async fn login(site: &TestSite) -> Result<OjSession, LoginError> {
    let address = site.address();
    tokio::task::spawn_blocking(move || -> Result<OjSession, LoginError> {
        let session = OjSession::new(&address)?;
        session.login(&credentials())?;
        Ok(session)
    })
    .await
    .expect("Failed to join the login task.")
}

#[tokio::test(flavor = "multi_thread")]
async fn login_sends_the_csrf_token_and_credentials() {
    let site = TestSite::spawn().await;
    site.mount_profile().await;
    site.mount_tfa(false).await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(header("X-CSRFToken", CSRF_TOKEN))
        .and(body_json(json!({ "username": "admin", "password": "rootroot" })))
        .respond_with(ok(json!("Succeeded")))
        .expect(1)
        .mount(&site.server)
        .await;

    let session = assert_ok!(login(&site).await);
    assert_eq!(session.csrf_token().as_deref(), Some(CSRF_TOKEN));
}

#[tokio::test(flavor = "multi_thread")]
async fn an_authenticated_session_skips_the_login() {
    let site = TestSite::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ok(json!({ "user": { "username": "admin" } })))
        .mount(&site.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ok(json!("Succeeded")))
        .expect(0)
        .mount(&site.server)
        .await;

    assert_ok!(login(&site).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn two_factor_accounts_are_refused() {
    let site = TestSite::spawn().await;
    site.mount_profile().await;
    site.mount_tfa(true).await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ok(json!("Succeeded")))
        .expect(0)
        .mount(&site.server)
        .await;

    let err = assert_err!(login(&site).await);
    assert_matches!(err, LoginError::TwoFactorRequired);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_wrong_password_is_rejected_with_the_site_message() {
    let site = TestSite::spawn().await;
    site.mount_profile().await;
    site.mount_tfa(false).await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(failure("error", "Invalid username or password"))
        .mount(&site.server)
        .await;

    let err = assert_err!(login(&site).await);
    assert!(!err.is_auth());
    assert!(err.to_string().contains("Invalid username or password"));
    assert_matches!(err, LoginError::Rejected(_));
}

#[tokio::test(flavor = "multi_thread")]
async fn a_site_that_is_down_is_a_transport_error() {
    let site = TestSite::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&site.server)
        .await;

    let err = assert_err!(login(&site).await);
    match err {
        LoginError::Api(e) => assert!(!e.is_auth()),
        other => panic!("Expected an API error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn a_refused_session_is_an_auth_error() {
    let site = TestSite::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&site.server)
        .await;

    let err = assert_err!(login(&site).await);
    assert!(err.is_auth());
    assert_matches!(err, LoginError::Api(_));
}
