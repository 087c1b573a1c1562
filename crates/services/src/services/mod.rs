pub mod config;
pub mod event_key;
pub mod mailbox;
pub mod storage;
