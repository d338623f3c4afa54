//! Access to the backend metrics API.
//!
//! All endpoints are plain `GET`s returning JSON. Non-2xx responses become
//! [`ApiError::Status`](crate::error::ApiError::Status) with the status code
//! and response body.

mod client;

pub use client::{ApiClient, ACCESS_TOKEN_HEADER};
