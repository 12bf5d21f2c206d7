//! Camera models.

pub mod perspective;
