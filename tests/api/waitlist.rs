use crate::helpers::spawn_app;

const HEADER: &str = "Name,Email,Source,Message,Timestamp";

/// Test the `/waitlist` endpoint with a valid sign-up
#[tokio::test]
async fn join_ok() {
    let app = spawn_app().await;

    let resp = app
        .post_waitlist_form(&[
            ("name", "Ada Lovelace"),
            ("email", "Ada@Example.com"),
            ("source", "social"),
            ("message", ""),
        ])
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully joined the waitlist!");

    // the side effect: header + exactly one row, email normalised
    let contents = app.log_contents().unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("Ada Lovelace,ada@example.com,social,,"));

    let entries = app.log_entries();
    assert_eq!(entries.len(), 1);
    // stamped by the store, not the caller
    assert!(chrono::DateTime::parse_from_rfc3339(&entries[0].timestamp).is_ok());
}

#[tokio::test]
async fn message_is_optional() {
    let app = spawn_app().await;

    let resp = app
        .post_waitlist("name=Ada&email=ada%40example.com&source=blog".to_string())
        .await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(app.log_entries()[0].message, "");
}

/// Resubmitting the same email, in any casing/padding, is rejected and the
/// log stays as it was
#[tokio::test]
async fn join_twice_is_conflict() {
    let app = spawn_app().await;
    let resp = app
        .post_waitlist("name=Ada&email=Foo%40Bar.com&source=friend".to_string())
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let before = app.log_contents().unwrap();

    for email in ["foo%40bar.com", "FOO%40BAR.COM", "foo%40bar.com%20"] {
        let resp = app
            .post_waitlist(format!("name=Someone&email={email}&source=other"))
            .await;
        assert_eq!(resp.status().as_u16(), 409, "{email}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "This email address is already on our waitlist.");
    }

    assert_eq!(app.log_contents().unwrap(), before);
}

/// Missing/invalid fields are rejected before the log is ever touched
#[tokio::test]
async fn join_invalid() {
    let app = spawn_app().await;

    for (body, msg) in [
        ("", "null"),
        ("email=ada%40example.com&source=social", "null name"),
        ("name=Ada&source=social", "null email"),
        ("name=Ada&email=ada%40example.com", "null source"),
        ("name=%20%20&email=ada%40example.com&source=social", "blank name"),
        ("name=Ada&email=&source=social", "empty email"),
        ("name=Ada&email=ada%40example.com&source=", "empty source"),
        ("name=Ada&email=not-an-email&source=social", "no at"),
        ("name=Ada&email=a%40b&source=social", "no tld"),
        ("name=Ada&email=%40b.com&source=social", "no local part"),
        ("name=Ada&email=ada%40example.com&source=telepathy", "unknown source"),
    ] {
        let resp = app.post_waitlist(body.to_owned()).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false, "{msg}");
        assert!(body["error"].is_string(), "{msg}");
    }

    assert!(app.log_contents().is_none());
}

#[tokio::test]
async fn invalid_email_message() {
    let app = spawn_app().await;

    let resp = app
        .post_waitlist("name=Ada&email=not-an-email&source=social".to_string())
        .await;

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please enter a valid email address.");
}

/// A name with a comma is quoted on the way in, and parsed back as-is by the
/// next duplicate check
#[tokio::test]
async fn comma_in_name_round_trips() {
    let app = spawn_app().await;

    let resp = app
        .post_waitlist_form(&[
            ("name", "Smith, Jr."),
            ("email", "smith@example.com"),
            ("source", "newsletter"),
            ("message", "Sales data, \"mostly\"\nand some logs"),
        ])
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .post_waitlist_form(&[
            ("name", "Smith"),
            ("email", "SMITH@example.com"),
            ("source", "newsletter"),
        ])
        .await;
    assert_eq!(resp.status().as_u16(), 409);

    let entries = app.log_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Smith, Jr.");
    assert_eq!(entries[0].email, "smith@example.com");
    assert_eq!(entries[0].message, "Sales data, \"mostly\"\nand some logs");
    assert!(app
        .log_contents()
        .unwrap()
        .contains(r#""Smith, Jr.",smith@example.com"#));
}

/// Two simultaneous sign-ups with the same email: exactly one wins
#[tokio::test]
async fn concurrent_duplicates() {
    let app = spawn_app().await;

    let (a, b) = tokio::join!(
        app.post_waitlist("name=A&email=race%40example.com&source=search".to_string()),
        app.post_waitlist("name=B&email=Race%40Example.com&source=search".to_string()),
    );

    let mut statuses = [a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

    let entries = app.log_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].email, "race@example.com");
}

#[tokio::test]
async fn distinct_emails_all_land() {
    let app = spawn_app().await;

    for i in 0..5 {
        let resp = app
            .post_waitlist(format!("name=User+{i}&email=user{i}%40example.com&source=conference"))
            .await;
        assert_eq!(resp.status().as_u16(), 200);
    }

    let entries = app.log_entries();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[3].name, "User 3");
}

/// A log that can't be parsed is a server-side problem; the user gets a
/// generic message and the file is left alone
#[tokio::test]
async fn unreadable_log_is_500() {
    let app = spawn_app().await;
    std::fs::create_dir_all(app.log_path.parent().unwrap()).unwrap();
    let garbage = b"Name,Email\n\xff\xfe\n".to_vec();
    std::fs::write(&app.log_path, &garbage).unwrap();

    let resp = app
        .post_waitlist("name=Ada&email=ada%40example.com&source=social".to_string())
        .await;

    assert_eq!(resp.status().as_u16(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "An error occurred while saving your information. Please try again."
    );
    assert_eq!(std::fs::read(&app.log_path).unwrap(), garbage);
}
