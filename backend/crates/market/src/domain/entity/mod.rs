//! Entity Module

pub mod item;
pub mod location;
pub mod thread;
