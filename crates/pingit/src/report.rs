pub mod csv;
pub mod json;
pub mod silent;
pub mod stream;
mod types;
