mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod schema;
    pub mod seed;
    pub mod slug;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod config;
mod constants;
mod document;

pub use authentication::*;
pub use config::*;
pub use constants::*;
pub use database::*;
pub use document::*;
