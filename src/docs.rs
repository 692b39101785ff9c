use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::analytics::model::{AnalyticsOverview, GradeCount, HallOccupancy};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequestDto,
    ResetPasswordRequest,
};
use crate::modules::brag_sheets::model::{
    BragCategory, BragEntry, BragStatus, CreateBragEntryDto, PendingBragEntry, ReviewBragEntryDto,
    UpdateBragEntryDto,
};
use crate::modules::chat::model::{ChatMessage, ChatRequestDto, ChatRole};
use crate::modules::discussions::model::{
    CreateDiscussionDto, CreateReplyDto, Discussion, DiscussionReply, DiscussionSummary,
    DiscussionThread, PaginatedDiscussionsResponse,
};
use crate::modules::feedback::model::{
    CreateFeedbackDto, Feedback, FeedbackStatus, FeedbackWithAuthor, PaginatedFeedbackResponse,
    UpdateFeedbackStatusDto,
};
use crate::modules::menus::model::{
    CreateMenuItemDto, ImportMenuDto, ImportMenuResponse, Meal, MenuDayResponse, MenuItem,
    UpdateMenuItemDto,
};
use crate::modules::roles::model::{
    AssignRoleDto, BaseRole, CreateCustomRoleDto, CustomRole, PaginatedCustomRolesResponse,
    Permission, RoleAssignment, RoleAssignmentResponse, RoleAssignmentView, UpdateCustomRoleDto,
};
use crate::modules::schedules::model::{
    CreateScheduleEntryDto, ScheduleEntry, UpdateScheduleEntryDto,
};
use crate::modules::schools::model::{
    CreateSchoolDto, PaginatedSchoolsResponse, School, UpdateSchoolDto,
};
use crate::modules::study_halls::model::{
    CreateStudyHallDto, StudyHall, StudyHallSession, StudyHallView, UpdateStudyHallDto,
};
use crate::modules::tasks::model::{
    CreateTaskDto, PaginatedTasksResponse, Task, UpdateTaskDto,
};
use crate::modules::users::model::{
    AccountDeletionResponse, PaginatedUsersResponse, TableDeletion, UpdateProfileDto,
    UpdateUserDto, User,
};
use crate::utils::pagination::{PaginationMeta, PaginationParams};
use crate::utils::transfer::{ImportReport, RowError};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::get_my_profile,
        crate::modules::users::controller::update_my_profile,
        crate::modules::users::controller::delete_my_account,
        crate::modules::users::controller::get_my_permissions,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::roles::controller::get_permissions,
        crate::modules::roles::controller::create_custom_role,
        crate::modules::roles::controller::get_custom_roles,
        crate::modules::roles::controller::get_custom_role_by_id,
        crate::modules::roles::controller::update_custom_role,
        crate::modules::roles::controller::delete_custom_role,
        crate::modules::roles::controller::get_user_role_assignments,
        crate::modules::roles::controller::assign_role_to_user,
        crate::modules::roles::controller::remove_role_from_user,
        crate::modules::schools::controller::create_school,
        crate::modules::schools::controller::get_schools,
        crate::modules::schools::controller::get_school,
        crate::modules::schools::controller::update_school,
        crate::modules::schools::controller::delete_school,
        crate::modules::menus::controller::get_menu_day,
        crate::modules::menus::controller::create_menu_item,
        crate::modules::menus::controller::update_menu_item,
        crate::modules::menus::controller::delete_menu_item,
        crate::modules::menus::controller::import_menu,
        crate::modules::tasks::controller::create_task,
        crate::modules::tasks::controller::get_tasks,
        crate::modules::tasks::controller::get_task,
        crate::modules::tasks::controller::update_task,
        crate::modules::tasks::controller::delete_task,
        crate::modules::tasks::controller::export_tasks,
        crate::modules::tasks::controller::import_tasks,
        crate::modules::schedules::controller::create_entry,
        crate::modules::schedules::controller::get_entries,
        crate::modules::schedules::controller::update_entry,
        crate::modules::schedules::controller::delete_entry,
        crate::modules::schedules::controller::export_entries,
        crate::modules::schedules::controller::import_entries,
        crate::modules::study_halls::controller::get_study_halls,
        crate::modules::study_halls::controller::create_study_hall,
        crate::modules::study_halls::controller::update_study_hall,
        crate::modules::study_halls::controller::delete_study_hall,
        crate::modules::study_halls::controller::check_in,
        crate::modules::study_halls::controller::check_out,
        crate::modules::discussions::controller::get_discussions,
        crate::modules::discussions::controller::create_discussion,
        crate::modules::discussions::controller::get_discussion,
        crate::modules::discussions::controller::create_reply,
        crate::modules::discussions::controller::delete_discussion,
        crate::modules::discussions::controller::delete_reply,
        crate::modules::discussions::controller::lock_discussion,
        crate::modules::discussions::controller::unlock_discussion,
        crate::modules::brag_sheets::controller::get_my_entries,
        crate::modules::brag_sheets::controller::create_entry,
        crate::modules::brag_sheets::controller::update_entry,
        crate::modules::brag_sheets::controller::delete_entry,
        crate::modules::brag_sheets::controller::get_pending_entries,
        crate::modules::brag_sheets::controller::verify_entry,
        crate::modules::brag_sheets::controller::reject_entry,
        crate::modules::feedback::controller::create_feedback,
        crate::modules::feedback::controller::get_my_feedback,
        crate::modules::feedback::controller::get_all_feedback,
        crate::modules::feedback::controller::update_feedback_status,
        crate::modules::chat::controller::chat,
        crate::modules::analytics::controller::get_overview,
        crate::modules::events::controller::events_feed,
    ),
    components(
        schemas(
            User,
            UpdateProfileDto,
            UpdateUserDto,
            PaginatedUsersResponse,
            TableDeletion,
            AccountDeletionResponse,
            RegisterRequestDto,
            LoginRequest,
            LoginResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            MessageResponse,
            ErrorResponse,
            Permission,
            BaseRole,
            CustomRole,
            RoleAssignment,
            RoleAssignmentView,
            CreateCustomRoleDto,
            UpdateCustomRoleDto,
            AssignRoleDto,
            PaginatedCustomRolesResponse,
            RoleAssignmentResponse,
            School,
            CreateSchoolDto,
            UpdateSchoolDto,
            PaginatedSchoolsResponse,
            Meal,
            MenuItem,
            CreateMenuItemDto,
            UpdateMenuItemDto,
            MenuDayResponse,
            ImportMenuDto,
            ImportMenuResponse,
            Task,
            CreateTaskDto,
            UpdateTaskDto,
            PaginatedTasksResponse,
            ScheduleEntry,
            CreateScheduleEntryDto,
            UpdateScheduleEntryDto,
            StudyHall,
            StudyHallView,
            StudyHallSession,
            CreateStudyHallDto,
            UpdateStudyHallDto,
            Discussion,
            DiscussionSummary,
            DiscussionReply,
            DiscussionThread,
            CreateDiscussionDto,
            CreateReplyDto,
            PaginatedDiscussionsResponse,
            BragCategory,
            BragStatus,
            BragEntry,
            PendingBragEntry,
            CreateBragEntryDto,
            UpdateBragEntryDto,
            ReviewBragEntryDto,
            FeedbackStatus,
            Feedback,
            FeedbackWithAuthor,
            CreateFeedbackDto,
            UpdateFeedbackStatusDto,
            PaginatedFeedbackResponse,
            ChatRole,
            ChatMessage,
            ChatRequestDto,
            GradeCount,
            HallOccupancy,
            AnalyticsOverview,
            ImportReport,
            RowError,
            PaginationMeta,
            PaginationParams,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "User authentication endpoints"),
        (name = "Profile", description = "Own profile, permissions, and account deletion"),
        (name = "Users", description = "Admin user management endpoints"),
        (name = "Roles", description = "Permissions, custom roles, and role assignments"),
        (name = "Schools", description = "School management endpoints"),
        (name = "Menus", description = "Cafeteria menu items and menu import"),
        (name = "Tasks", description = "Personal tasks with JSON/CSV import/export"),
        (name = "Schedules", description = "Class schedules with ICS/JSON/CSV export"),
        (name = "Study halls", description = "Study halls and check-in sessions"),
        (name = "Discussions", description = "Discussion threads, replies, and moderation"),
        (name = "Brag sheet", description = "Portfolio entries and staff verification"),
        (name = "Feedback", description = "User feedback with status workflow"),
        (name = "Chat", description = "Streaming AI chat proxy"),
        (name = "Analytics", description = "School overview counters"),
        (name = "Events", description = "Server-sent change events")
    ),
    info(
        title = "LunchLit API",
        version = "0.1.0",
        description = "A school companion REST API built with Rust, Axum, and PostgreSQL: cafeteria menus, tasks, schedules, study halls, discussions, and brag sheets behind JWT-based authentication.",
        contact(
            name = "API Support",
            email = "support@lunchlit.app"
        ),
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
