pub mod analytics;
pub mod auth;
pub mod brag_sheets;
pub mod chat;
pub mod discussions;
pub mod events;
pub mod feedback;
pub mod menus;
pub mod roles;
pub mod schedules;
pub mod schools;
pub mod study_halls;
pub mod tasks;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;
