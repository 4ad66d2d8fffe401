//! Credential lifecycle against a mock token endpoint

mod common;

use common::{ACCESS_TOKEN, CLIENT_ID, Fixture, REFRESH_TOKEN};
use google::{AuthManager, Error, ManualTransport, scopes};
use mockito::Matcher;
use std::io::Cursor;

#[test]
fn valid_stored_credential_needs_no_network() {
    let mut fx = Fixture::new();
    fx.write_valid_token();
    let token_endpoint = fx.server.mock("POST", "/token").expect(0).create();

    let manager = fx.manager();
    assert!(manager.is_authenticated());
    let credential = manager.authenticate().unwrap();

    assert_eq!(credential.token, ACCESS_TOKEN);
    assert_eq!(manager.access_token().unwrap(), ACCESS_TOKEN);
    token_endpoint.assert();
}

#[test]
fn expired_credential_refreshes_once_and_persists() {
    let mut fx = Fixture::new();
    fx.write_expired_token();
    let token_endpoint = fx
        .server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), REFRESH_TOKEN.into()),
            Matcher::UrlEncoded("client_id".into(), CLIENT_ID.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "ya29.refreshed", "expires_in": 3599, "token_type": "Bearer"}"#)
        .expect(1)
        .create();

    let manager = fx.manager();
    let credential = manager.authenticate().unwrap();
    assert_eq!(credential.token, "ya29.refreshed");
    assert!(credential.is_valid());

    // Persisted before returning, refresh token kept
    let stored = fx.store().load().unwrap().unwrap();
    assert_eq!(stored.token, "ya29.refreshed");
    assert_eq!(stored.refresh_token.as_deref(), Some(REFRESH_TOKEN));

    // Second call is served from memory
    manager.authenticate().unwrap();
    token_endpoint.assert();
}

#[test]
fn rejected_refresh_is_an_auth_error() {
    let mut fx = Fixture::new();
    fx.write_expired_token();
    let _mock = fx
        .server
        .mock("POST", "/token")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#)
        .create();

    let err = fx.manager().authenticate().unwrap_err();
    match err {
        Error::Auth(message) => assert!(message.contains("invalid_grant"), "{message}"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[test]
fn missing_client_secrets_is_a_configuration_error() {
    let fx = Fixture::new();
    let manager = fx.manager();

    assert!(!manager.is_authenticated());
    let err = manager.authenticate().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)), "{err:?}");
}

#[test]
fn revoke_twice_leaves_no_credential() {
    let fx = Fixture::new();
    fx.write_valid_token();
    let manager = fx.manager();
    manager.authenticate().unwrap();

    manager.revoke().unwrap();
    manager.revoke().unwrap();

    assert!(!fx.store().exists());
    assert!(manager.credential().is_none());
    assert!(!manager.is_authenticated());
}

#[test]
fn manual_flow_exchanges_pasted_redirect_url() {
    let mut fx = Fixture::new();
    fx.write_secrets();
    let granted = scopes::ALL.join(" ");
    let token_endpoint = fx
        .server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "4/0AbCdEf".into()),
            Matcher::UrlEncoded("redirect_uri".into(), "http://localhost".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "access_token": "ya29.fresh",
                "refresh_token": "1//fresh-refresh",
                "expires_in": 3599,
                "scope": granted,
                "token_type": "Bearer"
            })
            .to_string(),
        )
        .expect(1)
        .create();

    let input = Cursor::new(b"http://localhost/?code=4/0AbCdEf&scope=drive\n".to_vec());
    let manager = AuthManager::new(fx.config()).with_transport(ManualTransport::new(input, Vec::new()));

    let credential = manager.authenticate().unwrap();
    assert_eq!(credential.token, "ya29.fresh");
    assert_eq!(credential.refresh_token.as_deref(), Some("1//fresh-refresh"));
    assert_eq!(credential.client_id, CLIENT_ID);
    assert_eq!(fx.store().load().unwrap().unwrap(), credential);
    token_endpoint.assert();
}

#[test]
fn manual_flow_rejects_blank_input() {
    let mut fx = Fixture::new();
    fx.write_secrets();
    let token_endpoint = fx.server.mock("POST", "/token").expect(0).create();

    let manager = AuthManager::new(fx.config())
        .with_transport(ManualTransport::new(Cursor::new(b"\n".to_vec()), Vec::new()));

    let err = manager.authenticate().unwrap_err();
    assert!(matches!(err, Error::InvalidAuthorizationInput), "{err:?}");
    assert!(!fx.store().exists());
    token_endpoint.assert();
}

#[test]
fn credential_missing_scopes_triggers_authorization() {
    let mut fx = Fixture::new();
    fx.write_secrets();
    let mut narrow = fx.write_valid_token();
    narrow.scopes = [scopes::DRIVE.to_string()].into_iter().collect();
    fx.store().save(&narrow).unwrap();

    let _mock = fx
        .server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "ya29.wider", "refresh_token": "1//r", "expires_in": 3599}"#)
        .expect(1)
        .create();

    let manager = AuthManager::new(fx.config())
        .with_transport(ManualTransport::new(Cursor::new(b"4/code\n".to_vec()), Vec::new()));
    assert!(!manager.is_authenticated());

    let credential = manager.authenticate().unwrap();
    assert_eq!(credential.token, "ya29.wider");
    // No scope in the response: the configured scopes are recorded
    assert!(credential.covers_scopes(&fx.config().scopes));
}
