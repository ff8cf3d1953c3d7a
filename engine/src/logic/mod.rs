pub mod placement;
pub mod reveal;
