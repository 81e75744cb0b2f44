//! Request extractors shared by the API handlers

pub mod caller;

pub use caller::CallerId;
