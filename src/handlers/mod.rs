pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod users;
pub mod validation;
