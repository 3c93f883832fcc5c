pub mod footer;
pub mod form;
pub mod format;
pub mod header;
pub mod lists;
pub mod render;
pub mod spinner;
