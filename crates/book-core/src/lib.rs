pub mod keywords;
pub mod projection;
pub mod script;
pub mod types;
