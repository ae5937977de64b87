pub mod app;
pub mod common;
pub mod component;
pub mod component_type;
pub mod filter;
pub mod image;
pub mod merge;
pub mod screen;

pub use app::*;
pub use common::*;
pub use component::*;
pub use component_type::*;
pub use filter::*;
pub use image::*;
pub use merge::{merge, merge_into, merge_layers};
pub use screen::*;
