//! Utility functions for the endpoint monitor

pub mod time;
pub mod url;

pub use time::*;
pub use url::*;
