pub mod config;
pub mod container;
pub mod error;
pub mod settings;

pub use error::AppError;
