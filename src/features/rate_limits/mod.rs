//! Per-client sliding-window rate limiting.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/rate-limit` | No | Caller's current window |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use models::ActivityLog;
pub use services::{Admission, RateLimiter};
pub use workers::ActivitySweeper;
