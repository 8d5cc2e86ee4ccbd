//! Terminal styling for logs and diffs

mod color;

pub use color::Palette;
pub use color::Styled;
