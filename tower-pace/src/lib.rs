//! # Tower Pace
//!
//! `tower-pace` puts a [`pace_limit::Cooldown`] in front of a
//! [Tower](https://github.com/tower-rs/tower) service.
//!
//! The first request passes straight through. Every request arriving before the cooldown
//! has elapsed is rejected with [`PaceError::Throttled`] without reaching the inner service;
//! nothing is queued or deferred. All services built from one [`ThrottleLayer`] share its
//! cooldown, so clones of a service throttle together.
//!
//! ## Feature Flags
//!
//! - `axum`: Enables `IntoResponse` for [`PaceError`], converting to HTTP status codes
//!   (429, 500).

mod error;
mod layer;
mod service;
mod utils;


pub use error::PaceError;
pub use layer::ThrottleLayer;
pub use service::ResponseFuture;
pub use service::ThrottleService;
pub use utils::ServiceBuilderExt;
