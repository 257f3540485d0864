pub mod booking;
pub mod chat;
pub mod faq;
pub mod partner;
pub mod property;
pub mod task;
