pub mod logging;
pub mod navigation;
pub mod query_params;
pub mod response;
