pub mod messages;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use self::messages::*;
pub use self::config::*;
pub use self::error::*;
pub use self::models::session::Session;
pub use self::utils::*;
