use crate::{
    AppState,
    auth::{ROLE_ADMIN, ROLE_STUDENT, issue_session, verify_password},
    models::{AdminLoginRequest, ApiMessage, LoginRequest, LoginResponse},
};
use axum::{Json, extract::State, http::StatusCode};

fn login_failure(status: StatusCode, message: &str) -> (StatusCode, Json<LoginResponse>) {
    (
        status,
        Json(LoginResponse {
            success: false,
            message: message.to_string(),
            ..Default::default()
        }),
    )
}

fn login_success(token: String, role: &str, name: String) -> (StatusCode, Json<LoginResponse>) {
    (
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            message: "login successful".to_string(),
            token: Some(token),
            role: Some(role.to_string()),
            name: Some(name),
        }),
    )
}

/// login
///
/// [Public Route] Unified login: the email is checked against admin accounts
/// first, then against students. Every credential failure returns the same
/// generic message so the endpoint cannot be used to enumerate accounts; the
/// one deliberate exception is a correct password on a not-yet-approved
/// student, which reports the pending state.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Bad credentials", body = LoginResponse),
        (status = 403, description = "Application pending approval", body = LoginResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return login_failure(StatusCode::BAD_REQUEST, "email and password are required");
    }

    if let Some(admin) = state.repo.get_admin_by_email(&payload.email).await {
        if admin.is_active && verify_password(&payload.password, &admin.password_hash) {
            state.repo.touch_admin_login(admin.id).await;
            let token = issue_session(&state.config, admin.id, ROLE_ADMIN, &admin.username);
            return login_success(token, ROLE_ADMIN, admin.username);
        }
        // An admin email with a wrong password must not fall through to the
        // student table.
        return login_failure(StatusCode::UNAUTHORIZED, "email or password incorrect");
    }

    if let Some(student) = state.repo.get_student_by_email(&payload.email).await {
        let verified = student
            .password_hash
            .as_deref()
            .map(|hash| verify_password(&payload.password, hash))
            .unwrap_or(false);
        if verified {
            if !student.is_approved {
                return login_failure(
                    StatusCode::FORBIDDEN,
                    "your application is pending approval",
                );
            }
            let token = issue_session(&state.config, student.id, ROLE_STUDENT, &student.name);
            return login_success(token, ROLE_STUDENT, student.name);
        }
    }

    login_failure(StatusCode::UNAUTHORIZED, "email or password incorrect")
}

/// admin_login
///
/// [Public Route] Console login by username. Inactive accounts fail exactly
/// like unknown ones.
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Bad credentials", body = LoginResponse)
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> (StatusCode, Json<LoginResponse>) {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return login_failure(StatusCode::BAD_REQUEST, "username and password are required");
    }

    match state.repo.get_admin_by_username(&payload.username).await {
        Some(admin) if admin.is_active && verify_password(&payload.password, &admin.password_hash) => {
            state.repo.touch_admin_login(admin.id).await;
            let token = issue_session(&state.config, admin.id, ROLE_ADMIN, &admin.username);
            login_success(token, ROLE_ADMIN, admin.username)
        }
        _ => login_failure(StatusCode::UNAUTHORIZED, "username or password incorrect"),
    }
}

/// logout
///
/// [Public Route] Sessions are signed tokens, so logout is client-side token
/// disposal; the endpoint exists so frontends have something to call.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Logged out", body = ApiMessage))
)]
pub async fn logout() -> Json<ApiMessage> {
    Json(ApiMessage {
        success: true,
        message: "logged out".to_string(),
    })
}
