pub mod config_loader;
pub mod log_config;
pub mod spin_lock;

pub use config_loader::{CodecConfig, ConfigLoader, CrcConfig, FrameConfig, LogConfig};
pub use log_config::{init_logging, LogLevel};
pub use spin_lock::{Backoff, RawSpinLock, SpinLock, SpinLockGuard};
