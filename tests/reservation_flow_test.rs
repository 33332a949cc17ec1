use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use httpmock::prelude::*;
use pawcare::config::commands::{Command, ReserveCommand};
use pawcare::core::session::{AuthSession, SessionStore};
use pawcare::domain::model::{Role, ServiceKind};
use pawcare::{Console, LocalStorage, PawcareError, Settings};
use tempfile::TempDir;

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(8, 0, 0))
        .unwrap()
}

async fn signed_in_console(
    server: &MockServer,
    temp_dir: &TempDir,
    role: Role,
) -> Result<Console> {
    SessionStore::new(LocalStorage::new(temp_dir.path()))
        .save(&AuthSession {
            token: "tok-amy".to_string(),
            role,
            user_id: "17".to_string(),
        })
        .await?;

    let settings = Settings::default().with_overrides(
        Some(server.base_url()),
        Some(temp_dir.path().to_string_lossy().to_string()),
        Some(5),
    );
    Ok(Console::new(settings).with_clock(fixed_now))
}

/// 完整預約流程：類型 -> 寵物 -> 日期 -> 醫師/時段 -> 付款 -> 確認
#[tokio::test]
async fn test_full_reservation_flow() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let console = signed_in_console(&server, &temp_dir, Role::Owner).await?;

    let pets_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/pets/17")
            .header("Authorization", "Bearer tok-amy");
        then.status(200).json_body(serde_json::json!({
            "pets": [{ "pet_id": 5, "name": "Mochi", "species": "cat" }]
        }));
    });

    let staff_mock = server.mock(|when, then| {
        when.method(GET).path("/user/staff/doctor");
        then.status(200).json_body(serde_json::json!({
            "doctors": [{
                "doctor_id": "doc-1",
                "full_name": "Dr. Chen",
                "role": "doctor",
                "available_times": ["10:00", "11:00"],
                "booked_times": ["2025-03-12 11:00"]
            }]
        }));
    });

    let output = console
        .run(Command::Reserve(ReserveCommand::Mode {
            kind: ServiceKind::Doctor,
        }))
        .await?;
    assert!(output.contains("next: pick a date"));

    console
        .run(Command::Reserve(ReserveCommand::Pet {
            pet_id: "5".to_string(),
        }))
        .await?;
    pets_mock.assert();

    let calendar = console
        .run(Command::Reserve(ReserveCommand::Calendar {
            year: None,
            month: None,
        }))
        .await?;
    println!("{}", calendar);
    assert!(calendar.contains("2025-03"));
    // 過去的日期不能選
    assert!(calendar.contains("( 9)"));
    assert!(calendar.contains(" 12 "));

    let output = console
        .run(Command::Reserve(ReserveCommand::Date {
            date: "2025-03-12".to_string(),
        }))
        .await?;
    assert!(output.contains("next: pick a staff member and time"));

    let staff = console.run(Command::Reserve(ReserveCommand::Staff)).await?;
    println!("{}", staff);
    assert!(staff.contains("Dr. Chen"));
    assert!(staff.contains("10:00"));
    assert!(!staff.contains("11:00"));

    // 已被預約的時段
    let err = console
        .run(Command::Reserve(ReserveCommand::Pick {
            staff_id: "doc-1".to_string(),
            time: "11:00".to_string(),
        }))
        .await
        .unwrap_err();
    assert!(matches!(err, PawcareError::InvalidValueError { .. }));

    let output = console
        .run(Command::Reserve(ReserveCommand::Pick {
            staff_id: "doc-1".to_string(),
            time: "10:00".to_string(),
        }))
        .await?;
    assert!(output.contains("next: pay"));
    staff_mock.assert_hits(3);

    let payment_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/payments/")
            .body_contains("\"amount\":800.0")
            .body_contains("\"staff_id\":\"doc-1\"")
            .body_contains("\"time\":\"10:00\"");
        then.status(201).json_body(serde_json::json!({
            "data": {
                "payment_id": "pay-1",
                "checkout_url": "https://pay.example/pay-1",
                "status": "pending"
            }
        }));
    });

    let output = console.run(Command::Reserve(ReserveCommand::Pay)).await?;
    assert!(output.contains("https://pay.example/pay-1"));
    // 重複付款不會再開一張
    console.run(Command::Reserve(ReserveCommand::Pay)).await?;
    payment_mock.assert_hits(1);

    let mut pending_mock = server.mock(|when, then| {
        when.method(GET).path("/payments/pay-1");
        then.status(200)
            .json_body(serde_json::json!({ "payment_id": "pay-1", "status": "pending" }));
    });

    let output = console.run(Command::Reserve(ReserveCommand::Verify)).await?;
    assert!(output.contains("not completed"));
    pending_mock.assert();
    pending_mock.delete();

    server.mock(|when, then| {
        when.method(GET).path("/payments/pay-1");
        then.status(200)
            .json_body(serde_json::json!({ "payment_id": "pay-1", "status": "paid" }));
    });
    let service_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/services")
            .body_contains("\"service_type\":\"doctor\"")
            .body_contains("\"pet_id\":\"5\"")
            .body_contains("\"date\":\"2025-03-12\"")
            .body_contains("\"payment_id\":\"pay-1\"");
        then.status(201).json_body(serde_json::json!({
            "message": "created",
            "service": { "SERVICEID": 99, "status": "pending" }
        }));
    });

    let output = console.run(Command::Reserve(ReserveCommand::Verify)).await?;
    assert!(output.contains("service 99"));

    // 再確認一次不會重複建立服務
    let output = console.run(Command::Reserve(ReserveCommand::Verify)).await?;
    assert!(output.contains("service 99"));
    service_mock.assert_hits(1);

    let draft = console.run(Command::Reserve(ReserveCommand::Show)).await?;
    assert!(draft.contains("next: done"));

    Ok(())
}

#[tokio::test]
async fn test_reservation_requires_owner_role() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let console = signed_in_console(&server, &temp_dir, Role::Doctor).await?;

    let err = console
        .run(Command::Reserve(ReserveCommand::Mode {
            kind: ServiceKind::Caretaker,
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, PawcareError::PermissionDenied { .. }));
    Ok(())
}

#[tokio::test]
async fn test_date_outside_window_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let console = signed_in_console(&server, &temp_dir, Role::Owner).await?;

    console
        .run(Command::Reserve(ReserveCommand::Mode {
            kind: ServiceKind::Caretaker,
        }))
        .await?;

    for date in ["2025-03-09", "2025-06-30"] {
        let err = console
            .run(Command::Reserve(ReserveCommand::Date {
                date: date.to_string(),
            }))
            .await
            .unwrap_err();
        assert!(
            matches!(err, PawcareError::InvalidValueError { ref field, .. } if field == "date"),
            "{} should be rejected",
            date
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_unknown_pet_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();
    let console = signed_in_console(&server, &temp_dir, Role::Owner).await?;

    server.mock(|when, then| {
        when.method(GET).path("/pets/17");
        then.status(200).json_body(serde_json::json!([]));
    });

    let err = console
        .run(Command::Reserve(ReserveCommand::Pet {
            pet_id: "someone-elses".to_string(),
        }))
        .await
        .unwrap_err();

    assert!(matches!(err, PawcareError::InvalidValueError { .. }));
    Ok(())
}
