//! Configuration module for the QuickStock intelligence runtime
//!
//! All environment reads happen here, once, at process start. The resulting
//! [`IntelligenceConfig`] is passed explicitly to the provider selector and
//! the backend factory.

pub mod types;

pub use types::*;
