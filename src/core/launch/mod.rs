pub mod orchestrator;
pub mod task;

pub use orchestrator::Launcher;
pub use task::{spawn_game, GameLaunch};
