pub mod config;
pub mod root;

pub use config::EngineConfig;
pub use root::AnimationRoot;
