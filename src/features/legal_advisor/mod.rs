//! Legal question answering over HTTP.
//!
//! Every question runs the same lifecycle in `AnswerService`: validate,
//! throttle, log, ask the agent, normalize and format the answer.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | POST | `/ask` | No | Ask a legal question (rate limited per client) |

pub mod dtos;
pub mod handlers;
pub mod routes;
pub mod services;

pub use services::AnswerService;
