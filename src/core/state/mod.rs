pub mod app_state;
pub mod identity;
pub mod settings;

pub use app_state::AppState;
pub use identity::PlayerIdentityStore;
pub use settings::{SettingsStore, LAST_PLAYER_KEY};
