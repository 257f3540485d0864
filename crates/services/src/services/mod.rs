pub mod config;
pub mod dashboard;
pub mod faq;
pub mod inbox;
pub mod live_list;
pub mod partners;
pub mod properties;
pub mod seed;
pub mod webhook;
