//! Value Object Module

pub mod country;
pub mod item_name;
pub mod message_text;
pub mod phone_no;
pub mod place_name;
