// feed-client/src/lib.rs
pub mod auth;
pub mod bootstrap;
pub mod identity;
pub mod realtime;
pub mod store;
pub mod view;
