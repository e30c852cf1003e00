pub mod header;
pub mod utils;

pub use header::draw_header;
pub use utils::{cell, centered, money, quantity, status_color};
