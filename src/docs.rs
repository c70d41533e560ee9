use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::model::{
    ErrorResponse, LoginForm, LogoutRequest, MessageResponse, TokenPair,
};
use crate::modules::billing::model::{
    CheckoutSessionResponse, ProductCreate, ProductResponse, SubscriptionCreate,
    SubscriptionResponse, WebhookConfigResponse, WebhookResponse,
};
use crate::modules::courses::model::{Course, CreateCourseDto, UpdateCourseDto};
use crate::modules::files::model::{CreateFileDto, File};
use crate::modules::lessons::model::{CreateLessonDto, Lesson, UpdateLessonDto};
use crate::modules::roles::model::{
    AssignRoleDto, CreatePermissionDto, CreateRoleDto, Permission, Role, RoleWithPermissions,
    UpdatePermissionDto, UpdateRoleDto,
};
use crate::modules::users::model::{CreateUserDto, UpdateUserDto, User, UserWithRoles};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::logout,
        crate::modules::auth::controller::test_token,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::roles::controller::create_permission,
        crate::modules::roles::controller::get_all_permissions,
        crate::modules::roles::controller::get_permission_by_id,
        crate::modules::roles::controller::update_permission,
        crate::modules::roles::controller::delete_permission,
        crate::modules::roles::controller::create_role,
        crate::modules::roles::controller::get_all_roles,
        crate::modules::roles::controller::get_role_by_id,
        crate::modules::roles::controller::update_role,
        crate::modules::roles::controller::delete_role,
        crate::modules::roles::controller::assign_role,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::get_all_courses,
        crate::modules::courses::controller::get_course,
        crate::modules::courses::controller::update_course,
        crate::modules::courses::controller::delete_course,
        crate::modules::courses::controller::enroll,
        crate::modules::lessons::controller::create_lesson,
        crate::modules::lessons::controller::get_all_lessons,
        crate::modules::lessons::controller::get_lesson,
        crate::modules::lessons::controller::update_lesson,
        crate::modules::lessons::controller::delete_lesson,
        crate::modules::files::controller::create_file,
        crate::modules::files::controller::get_all_files,
        crate::modules::files::controller::get_file,
        crate::modules::files::controller::delete_file,
        crate::modules::billing::controller::stripe_webhook,
        crate::modules::billing::controller::webhook_config,
        crate::modules::billing::controller::create_product,
        crate::modules::billing::controller::list_products,
        crate::modules::billing::controller::create_subscription,
        crate::modules::billing::controller::list_subscriptions,
        crate::modules::billing::controller::search_subscriptions,
        crate::modules::billing::controller::cancel_subscription,
        crate::modules::billing::controller::resume_subscription,
        crate::modules::billing::controller::create_checkout_session,
    ),
    components(
        schemas(
            LoginForm,
            TokenPair,
            LogoutRequest,
            MessageResponse,
            ErrorResponse,
            User,
            UserWithRoles,
            CreateUserDto,
            UpdateUserDto,
            Permission,
            Role,
            RoleWithPermissions,
            CreatePermissionDto,
            UpdatePermissionDto,
            CreateRoleDto,
            UpdateRoleDto,
            AssignRoleDto,
            Course,
            CreateCourseDto,
            UpdateCourseDto,
            Lesson,
            CreateLessonDto,
            UpdateLessonDto,
            File,
            CreateFileDto,
            ProductCreate,
            ProductResponse,
            SubscriptionCreate,
            SubscriptionResponse,
            CheckoutSessionResponse,
            WebhookResponse,
            WebhookConfigResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication and token lifecycle"),
        (name = "Users", description = "User accounts"),
        (name = "Permissions", description = "Atomic capabilities"),
        (name = "Roles", description = "Role management and assignment"),
        (name = "Courses", description = "Course catalog"),
        (name = "Lessons", description = "Course lessons"),
        (name = "Files", description = "Stored file metadata"),
        (name = "Stripe", description = "Billing and payment gateway integration"),
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
            );
        }
    }
}
