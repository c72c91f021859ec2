pub mod characters;
pub mod form;
pub mod session;
