pub mod genre;
pub mod request;
pub mod story;
