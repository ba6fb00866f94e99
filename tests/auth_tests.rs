mod common;

use common::spawn_app;
use serde_json::{Value, json};
use society_portal::{
    AppConfig,
    auth::{ROLE_ADMIN, ROLE_STUDENT, issue_session},
};

#[tokio::test]
async fn unified_login_authenticates_an_admin_by_email() {
    let app = spawn_app().await;
    let admin = app.repo.seed_admin("root", "root@society.org", "rootpw");
    assert!(admin.last_login.is_none());

    let body: Value = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({"email": "root@society.org", "password": "rootpw"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["role"], "admin");
    assert_eq!(body["name"], "root");
    assert!(body["token"].as_str().unwrap().len() > 20);

    // A successful login records the timestamp.
    assert!(app.repo.admin_by_id(admin.id).unwrap().last_login.is_some());
}

#[tokio::test]
async fn unified_login_authenticates_an_approved_student() {
    let app = spawn_app().await;
    app.repo
        .seed_student_full("Alice", "alice@uni.edu", true, None, None, "alicepw");

    let body: Value = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({"email": "alice@uni.edu", "password": "alicepw"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], json!(true));
    assert_eq!(body["role"], "student");
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn pending_student_with_correct_password_sees_pending_message() {
    let app = spawn_app().await;
    app.repo
        .seed_student_full("Bob", "bob@uni.edu", false, None, None, "bobpw");

    let response = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({"email": "bob@uni.edu", "password": "bobpw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().unwrap().contains("pending"));
    assert!(body["token"].is_null());
}

#[tokio::test]
async fn wrong_credentials_get_the_same_generic_message() {
    let app = spawn_app().await;
    app.repo.seed_admin("root", "root@society.org", "rootpw");
    app.repo
        .seed_student_full("Alice", "alice@uni.edu", true, None, None, "alicepw");

    // Wrong password on an admin email, wrong password on a student email and
    // an unknown email must be indistinguishable.
    let mut messages = Vec::new();
    for (email, password) in [
        ("root@society.org", "wrong"),
        ("alice@uni.edu", "wrong"),
        ("nobody@uni.edu", "whatever"),
    ] {
        let response = app
            .client
            .post(app.url("/api/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        let body: Value = response.json().await.unwrap();
        messages.push(body["message"].as_str().unwrap().to_string());
    }
    assert_eq!(messages[0], messages[1]);
    assert_eq!(messages[1], messages[2]);
}

#[tokio::test]
async fn admin_login_is_by_username() {
    let app = spawn_app().await;
    app.repo.seed_admin("root", "root@society.org", "rootpw");

    let body: Value = app
        .client
        .post(app.url("/admin/login"))
        .json(&json!({"username": "root", "password": "rootpw"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["role"], "admin");

    let response = app
        .client
        .post(app.url("/admin/login"))
        .json(&json!({"username": "root", "password": "nope"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn deactivated_admin_cannot_log_in() {
    let app = spawn_app().await;
    let admin = app.repo.seed_admin("root", "root@society.org", "rootpw");
    app.repo.deactivate_admin(admin.id);

    let response = app
        .client
        .post(app.url("/admin/login"))
        .json(&json!({"username": "root", "password": "rootpw"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn bearer_token_from_login_opens_the_admin_console() {
    let app = spawn_app().await;
    app.repo.seed_admin("root", "root@society.org", "rootpw");

    let body: Value = app
        .client
        .post(app.url("/admin/login"))
        .json(&json!({"username": "root", "password": "rootpw"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = body["token"].as_str().unwrap();

    let response = app
        .client
        .get(app.url("/admin"))
        .header("authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn session_cookie_works_as_well_as_the_bearer_header() {
    let app = spawn_app().await;
    let admin = app.repo.seed_admin("root", "root@society.org", "rootpw");
    let token = issue_session(&AppConfig::default(), admin.id, ROLE_ADMIN, "root");

    let response = app
        .client
        .get(app.url("/admin"))
        .header("cookie", format!("theme=dark; session={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn student_session_does_not_open_the_admin_console() {
    let app = spawn_app().await;
    let student = app
        .repo
        .seed_student_full("Alice", "alice@uni.edu", true, None, None, "alicepw");
    let token = issue_session(&AppConfig::default(), student.id, ROLE_STUDENT, "Alice");

    let response = app
        .client
        .get(app.url("/admin"))
        .header("authorization", format!("Bearer {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn logout_acknowledges() {
    let app = spawn_app().await;
    let body: Value = app
        .client
        .post(app.url("/api/logout"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], json!(true));
}
