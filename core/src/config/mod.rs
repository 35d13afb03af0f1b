mod load;
mod types;

pub use load::{apply_env_overrides, load, parse_str, ConfigFormat};
pub use types::*;
