mod attacker;
mod connection;
mod target;

pub mod prelude {
    pub use crate::attacker::Attacker;
    pub use crate::connection::{
        Connection, ConnectionOptions, Credentials, DEFAULT_GATEWAY_URL, DEFAULT_TOKEN_URL,
    };
    pub use crate::target::Target;

    // Re-exported so that scenarios can build targets without depending on reqwest directly
    pub use reqwest::Method;
}
