pub mod console;
pub mod knowledge;
pub mod legal_advisor;
pub mod rate_limits;
