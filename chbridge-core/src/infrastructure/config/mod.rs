// chbridge-core/src/infrastructure/config/mod.rs

pub mod settings;

pub use settings::{
    BridgeConfig, FileConfig, ServiceConfig, TransferConfig, apply_env_overrides, load_config,
};
