pub mod entity;
pub mod path;
pub mod request;
pub mod response;
