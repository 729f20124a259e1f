mod ask_dto;

pub use ask_dto::{AskRequestDto, AskResponseDto};
