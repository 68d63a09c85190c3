// src/models/mod.rs
pub mod api;
pub mod mcq;
pub mod quote;

pub use mcq::{McqList, McqOption, McqQuestion};
