pub mod dispatch;
pub mod generator;
pub mod guide;
pub mod regex_gen;
pub mod url_service;

pub use url_service::NotificationUrlService;
