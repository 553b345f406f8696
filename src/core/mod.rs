//! Core infrastructure shared by every stage.

pub mod output;
