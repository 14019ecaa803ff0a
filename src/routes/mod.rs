pub mod auth;
pub mod health;
pub mod integrations;
pub mod meetings;
pub mod projects;
pub mod tasks;

use actix_web::{error, web};

use crate::auth::AuthMiddleware;
use crate::error::AppError;

fn unprocessable(detail: String) -> error::Error {
    AppError::ValidationError(detail).into()
}

/// Registers every route. Bodies and query strings that fail to deserialize
/// are answered with 422, like failed validation.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| unprocessable(err.to_string())),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| unprocessable(err.to_string())),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _| unprocessable(err.to_string())),
    )
    .service(health::health)
    .service(
        web::scope("/api")
            .wrap(AuthMiddleware)
            .service(
                web::scope("/auth")
                    .service(auth::register)
                    .service(auth::token)
                    .service(auth::login)
                    .service(auth::me)
                    .service(auth::logout),
            )
            .service(
                web::scope("/projects")
                    .service(projects::list_projects)
                    .service(projects::create_project)
                    .service(projects::get_project)
                    .service(projects::update_project)
                    .service(projects::delete_project)
                    .service(projects::add_member)
                    .service(projects::update_member)
                    .service(projects::remove_member),
            )
            .service(
                web::scope("/tasks")
                    .service(tasks::get_tasks)
                    .service(tasks::create_task)
                    .service(tasks::get_task)
                    .service(tasks::update_task),
            )
            .service(
                web::scope("/meetings")
                    .service(meetings::get_meetings)
                    .service(meetings::create_meeting),
            )
            .service(web::scope("/integrations").service(integrations::get_integrations)),
    );
}
