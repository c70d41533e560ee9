pub mod auth;
pub mod billing;
pub mod courses;
pub mod files;
pub mod lessons;
pub mod roles;
pub mod users;
