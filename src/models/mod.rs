pub mod common;
pub mod gemini;
pub mod history;
pub mod image;

pub use common::*;
pub use gemini::*;
pub use history::*;
pub use image::*;
