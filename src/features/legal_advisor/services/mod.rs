mod answer_service;
mod formatting;
mod request_logger;

pub use answer_service::{AnswerError, AnswerResult, AnswerService};
