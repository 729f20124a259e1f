pub mod ask_handler;

pub use ask_handler::{ask, AskState};
