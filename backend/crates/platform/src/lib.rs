//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG tokens, SHA-256, Base64)
//! - Password hashing (Argon2id)
//! - Key-value store abstraction over Redis with an in-memory twin
//! - Outbound mail with fire-and-forget dispatch

pub mod crypto;
pub mod kv;
pub mod mail;
pub mod password;
