mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_then_get_returns_denormalized_names() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let (status, dept) = app
        .request(
            Method::POST,
            "/departments",
            Some(&hr),
            Some(json!({"name": "Engineering"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, role) = app
        .request(
            Method::POST,
            "/roles",
            Some(&hr),
            Some(json!({"name": "Software Engineer"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, created) = app
        .request(
            Method::POST,
            "/employees",
            Some(&hr),
            Some(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@staffdesk.test",
                "department_id": dept["id"],
                "role_id": role["id"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = app
        .request(
            Method::GET,
            &format!("/employees/{}", created["id"]),
            Some(&hr),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["first_name"], "Grace");
    assert_eq!(fetched["last_name"], "Hopper");
    assert_eq!(fetched["email"], "grace@staffdesk.test");
    assert_eq!(fetched["department"], "Engineering");
    assert_eq!(fetched["role"], "Software Engineer");
}

#[tokio::test]
async fn unset_references_read_as_null() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let (status, created) = app
        .request(
            Method::POST,
            "/employees",
            Some(&hr),
            Some(json!({
                "first_name": "Alan",
                "last_name": "Turing",
                "email": "alan@staffdesk.test"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fetched) = app
        .request(
            Method::GET,
            &format!("/employees/{}", created["id"]),
            Some(&hr),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(fetched["department"].is_null());
    assert!(fetched["role"].is_null());
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let payload = json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": "grace@staffdesk.test"
    });
    let (status, _) = app
        .request(Method::POST, "/employees", Some(&hr), Some(payload.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app
        .request(Method::POST, "/employees", Some(&hr), Some(payload))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already in use");
}

#[tokio::test]
async fn update_is_full_replace() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let (_, created) = app
        .request(
            Method::POST,
            "/employees",
            Some(&hr),
            Some(json!({
                "first_name": "Grace",
                "last_name": "Hopper",
                "email": "grace@staffdesk.test"
            })),
        )
        .await;

    let path = format!("/employees/{}", created["id"]);
    let (status, updated) = app
        .request(
            Method::PUT,
            &path,
            Some(&hr),
            Some(json!({
                "first_name": "Grace",
                "last_name": "Murray Hopper",
                "email": "gmh@staffdesk.test"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["last_name"], "Murray Hopper");
    assert_eq!(updated["email"], "gmh@staffdesk.test");
    assert!(updated["department_id"].is_null());

    // Omitting a required field is a structured 400.
    let (status, body) = app
        .request(
            Method::PUT,
            &path,
            Some(&hr),
            Some(json!({"first_name": "Grace"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/employees/4242",
            Some(&hr),
            Some(json!({
                "first_name": "No",
                "last_name": "One",
                "email": "noone@staffdesk.test"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Employee not found");

    let (status, _) = app
        .request(Method::GET, "/employees/4242", Some(&hr), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .request(Method::DELETE, "/employees/4242", Some(&hr), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_all_employees_in_id_order() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    for (first, email) in [("Ada", "ada@staffdesk.test"), ("Grace", "grace@staffdesk.test")] {
        let (status, _) = app
            .request(
                Method::POST,
                "/employees",
                Some(&hr),
                Some(json!({
                    "first_name": first,
                    "last_name": "Example",
                    "email": email
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, listed) = app.request(Method::GET, "/employees", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().expect("array response");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["first_name"], "Ada");
    assert_eq!(listed[1]["first_name"], "Grace");
}

#[tokio::test]
async fn delete_removes_the_employee() {
    let app = TestApp::spawn().await;
    let hr = app.hr_token().await;

    let (_, created) = app
        .request(
            Method::POST,
            "/employees",
            Some(&hr),
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@staffdesk.test"
            })),
        )
        .await;
    let path = format!("/employees/{}", created["id"]);

    let (status, body) = app.request(Method::DELETE, &path, Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Employee deleted");

    let (status, _) = app.request(Method::GET, &path, Some(&hr), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
