#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod draw;
pub mod entities;
pub mod error;
pub mod framework;
pub mod services;
pub mod store;
pub mod token;

pub use error::DrawError;
