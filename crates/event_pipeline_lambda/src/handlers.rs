pub mod dead_letter;
pub mod event_logger;
