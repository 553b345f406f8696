//! Internal utilities shared by the stage helpers.

pub mod fs_utils;
pub mod hash;
pub mod progress;
pub mod url_utils;
