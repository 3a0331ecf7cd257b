pub mod catalog;
pub mod formats;
pub mod settings;
pub mod yml_settings;
