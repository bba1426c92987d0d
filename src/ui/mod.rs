pub mod panels;
pub mod settings;
