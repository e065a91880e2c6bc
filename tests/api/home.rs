use crate::helpers::spawn_app;

#[tokio::test]
async fn home_serves_sign_up_form() {
    let app = spawn_app().await;

    let resp = app
        .api_client
        .get(&app.addr)
        .send()
        .await
        .expect("execute request");
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));

    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"action="/waitlist""#));
    // every referral source the store accepts is offered by the form
    for source in insights_waitlist::domain::ReferralSource::ALL {
        assert!(html.contains(&format!(r#"value="{source}""#)), "{source}");
    }
}
