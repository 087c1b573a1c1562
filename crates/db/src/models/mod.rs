#![allow(clippy::useless_conversion)]

pub mod event;
pub mod ids;
pub mod image;
