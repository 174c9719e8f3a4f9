pub mod bundle;
pub mod curriculum;
pub mod request;
