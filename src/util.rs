//! Shared utility modules used across Shrike components.

pub mod simd;
