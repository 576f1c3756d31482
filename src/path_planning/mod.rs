// Path Planning algorithms module

pub mod potential_field;
pub mod a_star;
pub mod path_reconstruction;

pub use potential_field::*;
pub use a_star::*;
pub use path_reconstruction::*;
