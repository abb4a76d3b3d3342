pub mod direction;
pub mod layout;
pub mod position;
pub mod view;
