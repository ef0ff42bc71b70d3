mod common;

use std::sync::Arc;

use client::ClientError;
use common::{RecordingMailer, TestServer};
use models::{
    Role,
    payloads::{ErrorResponse, MessageResponse, UserInput},
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_is_public() {
    let server = TestServer::start().await;

    let health: MessageResponse = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(health.success);
    assert_eq!(health.message, "Server is running");
}

#[tokio::test]
async fn test_missing_and_bad_tokens() {
    let server = TestServer::start().await;
    let http = reqwest::Client::new();

    let response = http.get(server.url("/meters")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert_eq!(body.error, "Not authorized, no token");

    let response = http
        .get(server.url("/meters"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "Not authorized, token failed");
}

#[tokio::test]
async fn test_login() {
    let server = TestServer::start().await;

    let mut client = server.client();
    let err = client.login("admin", "wrong-password").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 401, ref message } if message == "Invalid credentials"
    ));

    let err = client.login("nobody", "admin123").await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let user = client.login("  ADMIN ", common::ADMIN_PASSWORD).await.unwrap();
    assert_eq!(user.role, Role::Admin);
    assert_eq!(client.me().await.unwrap().username, "admin");
}

#[tokio::test]
async fn test_role_checks() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let installer = server
        .account(&admin, "rajesh", Role::Installer, None)
        .await;

    let err = installer.users().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 403, ref message }
            if message == "User role INSTALLER is not authorized to access this route"
    ));

    assert_eq!(installer.meter_stats().await.unwrap_err().status(), Some(403));
    assert_eq!(
        installer.sync_meter_statuses().await.unwrap_err().status(),
        Some(403)
    );
    assert!(installer.vendors().await.is_ok());
}

#[tokio::test]
async fn test_deleted_user_token_rejected() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    let installer = server
        .account(&admin, "rajesh", Role::Installer, None)
        .await;

    let id = installer.me().await.unwrap().id;
    admin.delete_user(&id).await.unwrap();

    assert_eq!(installer.me().await.unwrap_err().status(), Some(401));
    assert_eq!(admin.delete_user(&id).await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn test_email_flag_without_transport() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let input = UserInput {
        username: Some("amit".to_string()),
        password: Some("secret1".to_string()),
        name: Some("Amit Patel".to_string()),
        role: Some(Role::Installer),
        email: Some("amit@example.com".to_string()),
        ..UserInput::default()
    };
    let response = admin.create_user(&input).await.unwrap();

    assert!(!response.email_sent);
    assert_eq!(response.data.username, "amit");
    assert_eq!(admin.users().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_credentials_email_sent() {
    let mailer = Arc::new(RecordingMailer::default());
    let server = TestServer::start_with(Some(mailer.clone()), None).await;
    let admin = server.admin().await;

    let input = UserInput {
        username: Some("amit".to_string()),
        password: Some("secret1".to_string()),
        name: Some("Amit Patel".to_string()),
        role: Some(Role::Installer),
        email: Some("amit@example.com".to_string()),
        ..UserInput::default()
    };
    let created = admin.create_user(&input).await.unwrap();
    assert!(created.email_sent);

    let rename = UserInput {
        name: Some("Amit P.".to_string()),
        email: Some("amit@example.com".to_string()),
        ..UserInput::default()
    };
    let updated = admin.update_user(&created.data.id, &rename).await.unwrap();
    assert!(!updated.email_sent);
    assert_eq!(updated.data.name, "Amit P.");

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amit@example.com");
    assert!(sent[0].html.contains("secret1"));
}

#[tokio::test]
async fn test_password_change_emails_credentials() {
    let mailer = Arc::new(RecordingMailer::default());
    let server = TestServer::start_with(Some(mailer.clone()), None).await;
    let admin = server.admin().await;
    let input = UserInput {
        username: Some("suresh".to_string()),
        password: Some("first-pass".to_string()),
        name: Some("Suresh Reddy".to_string()),
        role: Some(Role::Installer),
        ..UserInput::default()
    };
    let created = admin.create_user(&input).await.unwrap();
    assert!(!created.email_sent);

    let reset = UserInput {
        password: Some("second-pass".to_string()),
        email: Some("suresh@example.com".to_string()),
        ..UserInput::default()
    };
    let updated = admin.update_user(&created.data.id, &reset).await.unwrap();
    assert!(updated.email_sent);

    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "suresh@example.com");
        assert!(sent[0].html.contains("suresh"));
        assert!(sent[0].html.contains("second-pass"));
    }

    let mut installer = server.client();
    installer.login("suresh", "second-pass").await.unwrap();
    assert_eq!(
        server.client().login("suresh", "first-pass").await.unwrap_err().status(),
        Some(401)
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestServer::start().await;

    for url in [
        server.url("/nothing-here"),
        format!("{}/outside-api", server.base_url),
    ] {
        let response = reqwest::get(url).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = response.json().await.unwrap();
        assert!(!body.success);
        assert_eq!(body.error, "Route not found");
    }
}

#[tokio::test]
async fn test_duplicate_username() {
    let server = TestServer::start().await;
    let admin = server.admin().await;
    server
        .account(&admin, "rajesh", Role::Installer, None)
        .await;

    let input = UserInput {
        username: Some("Rajesh".to_string()),
        password: Some("password1".to_string()),
        name: Some("Someone Else".to_string()),
        role: Some(Role::Installer),
        ..UserInput::default()
    };
    let err = admin.create_user(&input).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Api { status: 400, ref message }
            if message == "Username \"rajesh\" already exists. Please choose a different username."
    ));

    let other = server.account(&admin, "amit", Role::Installer, None).await;
    let id = other.me().await.unwrap().id;
    let rename = UserInput {
        username: Some("rajesh".to_string()),
        ..UserInput::default()
    };
    let err = admin.update_user(&id, &rename).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Username \"rajesh\" is already taken. Please choose a different username."
    );
}

#[tokio::test]
async fn test_vendor_account_needs_existing_vendor() {
    let server = TestServer::start().await;
    let admin = server.admin().await;

    let input = UserInput {
        username: Some("vendor1".to_string()),
        password: Some("password1".to_string()),
        name: Some("Vendor User".to_string()),
        role: Some(Role::Vendor),
        vendor_id: Some("missing".to_string()),
        email: None,
    };

    assert_eq!(admin.create_user(&input).await.unwrap_err().status(), Some(400));
}

#[tokio::test]
async fn test_malformed_json() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.success);
}
