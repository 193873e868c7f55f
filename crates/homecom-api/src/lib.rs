// homecom-api: Async Rust client for the Bosch HomeCom Easy cloud API

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Credentials, OAuthEndpoints, OAuthSession, TokenPair};
pub use client::HomeComClient;
pub use error::Error;
pub use models::{Device, DeviceType, Notification, Reference, ResourcePayload};
