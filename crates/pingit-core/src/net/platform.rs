#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::*;

#[cfg(not(unix))]
compile_error!("pingit-core only supports unix platforms");
