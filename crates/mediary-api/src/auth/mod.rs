pub mod cookie;
pub mod middleware;
pub mod models;

pub use models::CurrentUser;
