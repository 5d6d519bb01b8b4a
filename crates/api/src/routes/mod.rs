//! Route handlers

pub mod pages;
pub mod predictions;
