use anyhow::Result;
use httpmock::prelude::*;
use pawcare::config::commands::{Command, ProfileCommand};
use pawcare::core::session::SessionStore;
use pawcare::domain::model::Role;
use pawcare::{Console, LocalStorage, PawcareError, Settings};
use tempfile::TempDir;

fn settings(server: &MockServer, state_dir: &TempDir) -> Settings {
    Settings::default().with_overrides(
        Some(server.base_url()),
        Some(state_dir.path().to_string_lossy().to_string()),
        Some(5),
    )
}

/// 登入後 session 會被保存，後續請求帶上 token
#[tokio::test]
async fn test_login_persists_session_and_authorizes_requests() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/login/owner")
            .body_contains("\"email\":\"amy@example.com\"");
        then.status(200).json_body(serde_json::json!({
            "message": "ok",
            "data": {
                "accessToken": "tok-amy",
                "user": { "userId": 17, "role": "owner" }
            }
        }));
    });

    let profile_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/user/")
            .header("Authorization", "Bearer tok-amy");
        then.status(200).json_body(serde_json::json!({
            "success": true,
            "user": {
                "USERID": 17,
                "full_name": "Amy Lin",
                "email": "amy@example.com",
                "phone_number": "0912345678"
            }
        }));
    });

    let console = Console::new(settings(&server, &temp_dir));

    let output = console
        .run(Command::Login {
            role: Role::Owner,
            // 前後空白不應該送到 API
            email: "  amy@example.com ".to_string(),
            password: "secret1".to_string(),
        })
        .await?;
    println!("{}", output);
    assert!(output.contains("user 17"));
    login_mock.assert();

    let store = SessionStore::new(LocalStorage::new(temp_dir.path()));
    let session = store.load().await?.expect("session should be saved");
    assert_eq!(session.token, "tok-amy");
    assert_eq!(session.user_id, "17");
    assert_eq!(session.role, Role::Owner);

    let whoami = console.run(Command::Whoami).await?;
    assert!(whoami.contains("17"));

    let profile = console.run(Command::Profile(ProfileCommand::Show)).await?;
    println!("{}", profile);
    profile_mock.assert();
    assert!(profile.contains("Amy Lin"));
    assert!(profile.contains("0912345678"));

    let bye = console.run(Command::Logout).await?;
    assert!(bye.contains("Signed out"));
    assert!(store.load().await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_invalid_credentials_surface_server_message() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let login_mock = server.mock(|when, then| {
        when.method(POST).path("/auth/login/doctor");
        then.status(401)
            .json_body(serde_json::json!({ "error": "Wrong email or password" }));
    });

    let console = Console::new(settings(&server, &temp_dir));
    let err = console
        .run(Command::Login {
            role: Role::Doctor,
            email: "doc@example.com".to_string(),
            password: "whatever".to_string(),
        })
        .await
        .unwrap_err();

    login_mock.assert();
    assert_eq!(err.user_friendly_message(), "Wrong email or password");
    assert!(matches!(err, PawcareError::ApiStatusError { status: 401, .. }));

    // 失敗不應該留下 session
    let store = SessionStore::new(LocalStorage::new(temp_dir.path()));
    assert!(store.load().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_form_validation_happens_before_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let register_mock = server.mock(|when, then| {
        when.method(POST).path("/auth/register/owner");
        then.status(201);
    });

    let console = Console::new(settings(&server, &temp_dir));
    let err = console
        .run(Command::Register {
            role: Role::Owner,
            name: "Amy".to_string(),
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
            phone: None,
            address: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, PawcareError::InvalidValueError { .. }));
    register_mock.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_register_without_token_does_not_sign_in() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let register_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/auth/register/caretaker")
            .body_contains("\"name\":\"Ben\"")
            .body_contains("\"email\":\"ben@example.com\"");
        then.status(201)
            .json_body(serde_json::json!({ "data": { "user": { "id": 88 } } }));
    });

    let console = Console::new(settings(&server, &temp_dir));
    let output = console
        .run(Command::Register {
            role: Role::Caretaker,
            name: " Ben".to_string(),
            email: "ben@example.com\n".to_string(),
            password: "secret1".to_string(),
            phone: Some("0987-654-321".to_string()),
            address: None,
        })
        .await?;

    register_mock.assert();
    assert!(output.contains("user 88"));
    assert!(output.contains("pawcare login"));

    let err = console.run(Command::Whoami).await.unwrap_err();
    assert!(matches!(err, PawcareError::NotAuthenticated));
    Ok(())
}
