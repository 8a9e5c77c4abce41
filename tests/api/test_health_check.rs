use crate::helpers::spawn_app;

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(&format!("{}/health", &app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_unknown_routes_return_404() {
    let app = spawn_app().await;

    for path in ["/", "/contacts", "/api/contact/extra", "/health_check"] {
        let response = app
            .api_client
            .get(&format!("{}{}", &app.address, path))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(404, response.status().as_u16(), "GET {}", path);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": "Not found"}));
    }
}

#[tokio::test]
async fn test_health_check_is_served_without_contact_configuration() {
    let app = crate::helpers::spawn_app_with(|c| c.contact.recipients = None).await;

    let response = app
        .api_client
        .get(&format!("{}/health", &app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
}
