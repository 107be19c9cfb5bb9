pub mod data;
pub mod endpoint;
pub mod io;

pub use data::{ClientSettings, Config, EnvOverrides};
pub use io::ConfigError;
