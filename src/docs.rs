use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use tapak_core::{Action, ErrorResponse, FieldError, PaginationMeta, PaginationParams, Resource, Role, Status};
use tapak_models::{
    CreateModulDto, CreateProjectDto, CreateUserDto, GrantPermissionDto, LoginRequest,
    LoginResponse, MeResponse, Modul, Project, ProjectFilterParams, ProjectWithStats,
    RefreshTokenRequest, RoleWithPermissions, TokenResponse, UpdateModulDto, UpdateProjectDto,
    UpdateUserDto, Upload, User, UserFilterParams,
};

use crate::modules::health::HealthStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::health_check,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::me,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::roles::controller::get_roles,
        crate::modules::roles::controller::grant_permission,
        crate::modules::roles::controller::revoke_permission,
        crate::modules::projects::controller::get_projects,
        crate::modules::projects::controller::get_project,
        crate::modules::projects::controller::create_project,
        crate::modules::projects::controller::update_project,
        crate::modules::projects::controller::delete_project,
        crate::modules::moduls::controller::get_moduls,
        crate::modules::moduls::controller::get_modul,
        crate::modules::moduls::controller::create_modul,
        crate::modules::moduls::controller::update_modul,
        crate::modules::moduls::controller::delete_modul,
        crate::modules::uploads::controller::upload_options,
        crate::modules::uploads::controller::create_upload,
        crate::modules::uploads::controller::upload_status,
        crate::modules::uploads::controller::upload_chunk,
        crate::modules::uploads::controller::delete_upload,
        crate::modules::uploads::controller::get_uploads,
    ),
    components(
        schemas(
            Status,
            ErrorResponse,
            FieldError,
            PaginationMeta,
            PaginationParams,
            HealthStatus,
            LoginRequest,
            LoginResponse,
            TokenResponse,
            RefreshTokenRequest,
            MeResponse,
            User,
            CreateUserDto,
            UpdateUserDto,
            UserFilterParams,
            Role,
            Resource,
            Action,
            RoleWithPermissions,
            GrantPermissionDto,
            Project,
            ProjectWithStats,
            CreateProjectDto,
            UpdateProjectDto,
            ProjectFilterParams,
            Modul,
            CreateModulDto,
            UpdateModulDto,
            Upload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Authentication", description = "Login, token refresh and logout"),
        (name = "Users", description = "User management"),
        (name = "Roles", description = "Role permission grants"),
        (name = "Projects", description = "Project management"),
        (name = "Moduls", description = "Modules within a project"),
        (name = "Uploads", description = "Resumable uploads (tus 1.0.0 core, creation and termination)")
    ),
    info(
        title = "Tapak API",
        version = "0.1.0",
        description = "Project and module management API built with Rust, Axum and PostgreSQL. Every response uses the `{status, message, code, data|errors, timestamp}` envelope.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_module() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/health",
            "/api/auth/login",
            "/api/auth/me",
            "/api/users/{id}",
            "/api/roles/{role}/permissions/{resource}/{action}",
            "/api/projects/{project_id}/moduls/{id}",
            "/api/uploads/{id}",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
