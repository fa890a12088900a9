pub mod handler;
pub mod metadata;
pub mod report;
pub mod slack;

pub use handler::NotificationHandler;
