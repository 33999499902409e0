pub mod editor;
pub mod panels;
pub mod plot;
