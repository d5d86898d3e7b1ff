// QuickStock AI Library
// Demand intelligence for a hyper-local quick-commerce distributor

pub mod config;
pub mod context;
pub mod error;
pub mod forecast;
pub mod gateway;
pub mod intelligence;

pub use config::IntelligenceConfig;
pub use error::{IntelligenceError, IntelligenceResult};
