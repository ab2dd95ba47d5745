pub mod event;
pub mod issue;
pub mod outcome;
pub mod thread;
