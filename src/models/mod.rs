pub mod credential;
pub mod event;
pub mod operation;
