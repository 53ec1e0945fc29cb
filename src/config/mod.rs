pub mod settings;
pub mod tables;
pub mod validator;

pub use settings::*;
pub use tables::*;
pub use validator::*;
