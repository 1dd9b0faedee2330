pub mod catalog;
pub mod layout;
pub mod plan;
pub mod split;
pub mod validate;
