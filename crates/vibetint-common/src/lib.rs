pub mod errors;
pub mod id;
pub mod types;

pub use errors::SettingsError;
pub use id::{new_id, SessionId};
pub use types::{ColorMap, SettingsScope, TokenMap, TOKEN_RULES_KEY};
