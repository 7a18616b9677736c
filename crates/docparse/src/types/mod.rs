//! HTTP response bodies

pub mod response;

pub use response::{InfoResponse, ParseResponse, SupportedFormatsResponse};
