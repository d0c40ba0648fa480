use actix_web::{HttpRequest, HttpResponse, get, post, web};
use uuid::Uuid;

use sapphire_trails::common::{PasswordValidator, validate_email};
use sapphire_trails::log_err;
use sapphire_trails::models::{AdminRole, NewUser};
use sapphire_trails::services::AdminAuth;

use crate::web::forms::{AdminUserForm, LocalAdminForm};
use crate::web::helpers::{chrome, render, require_admin, toast_redirect};
use crate::web::session::ToastKind;
use crate::web::state::AppState;
use crate::web::templates::{AdminAdminsTemplate, AdminUsersTemplate};

const USERS: &str = "/admin/users";
const ADMINS: &str = "/admin/admins";

impl AdminUserForm {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".to_string());
        }
        if !validate_email(&self.email) {
            return Err("Enter a valid email address".to_string());
        }
        PasswordValidator::validate(&self.password)
    }

    fn into_new_user(self) -> NewUser {
        NewUser {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            password: self.password,
            user_type: "admin".to_string(),
        }
    }
}

// Admin accounts on the REST server

#[get("/admin/users")]
pub async fn users_list(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }

    let (users, error) = match state.api.list_admin_users().await {
        Ok(users) => (users, String::new()),
        Err(e) => {
            log_err!(e, serde_json::json!({ "fetch": "admin users" }));
            (Vec::new(), e.user_message())
        }
    };

    render(AdminUsersTemplate {
        chrome: chrome(&state, &req).await,
        users,
        error,
    })
}

#[post("/admin/users")]
pub async fn users_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<AdminUserForm>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let form = form.into_inner();
    if let Err(message) = form.validate() {
        return toast_redirect(&state, &req, ToastKind::Error, message, USERS);
    }

    let user = form.into_new_user();
    match state.api.create_user(&user).await {
        Ok(reply) => {
            log::info!("Created admin user {}", user.email);
            let message = reply
                .message
                .unwrap_or_else(|| format!("Admin {} created", user.name));
            toast_redirect(&state, &req, ToastKind::Success, message, USERS)
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "email": user.email }));
            toast_redirect(&state, &req, ToastKind::Error, e.user_message(), USERS)
        }
    }
}

#[post("/admin/users/{id}/delete")]
pub async fn users_delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let id = path.into_inner();

    match state.api.delete_user(&id).await {
        Ok(()) => {
            log::info!("Deleted admin user {}", id);
            toast_redirect(&state, &req, ToastKind::Success, "Admin user deleted", USERS)
        }
        Err(e) => {
            log_err!(e, serde_json::json!({ "user_id": id }));
            toast_redirect(&state, &req, ToastKind::Error, e.user_message(), USERS)
        }
    }
}

// Local admin-panel accounts

#[get("/admin/admins")]
pub async fn admins_list(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(resp) = require_admin(&state, &req).await {
        return resp;
    }
    let admins = AdminAuth::new(&state.db).list().await.unwrap_or_else(|e| {
        log_err!(e, serde_json::json!({ "key": "sapphire-admins" }));
        Vec::new()
    });

    render(AdminAdminsTemplate {
        chrome: chrome(&state, &req).await,
        admins,
    })
}

#[post("/admin/admins")]
pub async fn admins_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LocalAdminForm>,
) -> HttpResponse {
    let actor = match require_admin(&state, &req).await {
        Ok(admin) => admin,
        Err(resp) => return resp,
    };
    let Ok(role) = form.role.parse::<AdminRole>() else {
        return toast_redirect(&state, &req, ToastKind::Error, "Unknown role", ADMINS);
    };

    match AdminAuth::new(&state.db)
        .add_admin(&actor, &form.username, &form.password, role)
        .await
    {
        Ok(listing) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Admin '{}' added", listing.username),
            ADMINS,
        ),
        Err(err) => toast_redirect(&state, &req, ToastKind::Error, err.user_message(), ADMINS),
    }
}

#[post("/admin/admins/{username}/delete")]
pub async fn admins_delete(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HttpResponse {
    let actor = match require_admin(&state, &req).await {
        Ok(admin) => admin,
        Err(resp) => return resp,
    };
    let username = path.into_inner();

    match AdminAuth::new(&state.db).remove_admin(&actor, &username).await {
        Ok(()) => toast_redirect(
            &state,
            &req,
            ToastKind::Success,
            format!("Admin '{}' removed", username),
            ADMINS,
        ),
        Err(err) => toast_redirect(&state, &req, ToastKind::Error, err.user_message(), ADMINS),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(users_list)
        .service(users_create)
        .service(users_delete)
        .service(admins_list)
        .service(admins_create)
        .service(admins_delete);
}
