pub mod event;
pub mod image;
