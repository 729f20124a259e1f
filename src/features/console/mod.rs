//! Interactive console front end (`chat` subcommand).
//!
//! Shares the answer lifecycle with `/ask`; the identity is per session and
//! questions are not rate limited.

pub mod session;

pub use session::ConsoleSession;
