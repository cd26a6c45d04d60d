mod login;
mod provider;
mod schemes;
mod spec;

pub use provider::AuthProvider;
pub use schemes::{AuthSchemes, SchemeParser};
pub use spec::{AuthSpec, BearerSpec, LoginFlow, DEFAULT_TOKEN_PATH};

pub(crate) use spec::deserialize_header_map;
