use utoipa::OpenApi;

use crate::routes::{assignments, auth, courses, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        auth::register,
        auth::login,
        auth::logout,
        auth::me,
        users::list,
        users::create,
        users::search,
        users::get,
        users::update,
        users::delete,
        users::summary,
        users::recent_users,
        users::audit_logs,
        courses::list,
        courses::create,
        courses::available,
        courses::search,
        courses::get,
        courses::update,
        courses::delete,
        courses::set_progress,
        courses::assignments,
        courses::create_assignment,
        courses::enroll,
        courses::unenroll,
        courses::set_student_progress,
        courses::submissions,
        courses::my_enrollments,
        assignments::upcoming,
        assignments::pending,
        assignments::delete,
        assignments::state_of,
        assignments::submit,
        assignments::grade,
        assignments::mine,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::RegisterResponse,
            auth::LoginRequest,
            auth::SessionResponse,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            courses::CreateCourseRequest,
            courses::UpdateCourseRequest,
            courses::ProgressRequest,
            courses::CreateAssignmentRequest,
            assignments::SubmitRequest,
            assignments::GradeRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "courses"),
        (name = "enrollment"),
        (name = "assignments"),
        (name = "grading"),
        (name = "reports")
    )
)]
pub struct ApiDoc;
