//! QuantumSink - 可组合的同步日志输出目标
//!
//! QuantumSink 为日志系统提供底层的字节输出边界：
//! 统一的 `WriteSyncer` 接口，以及可以任意嵌套的包装器，
//! 包括独占访问、定时刷新的缓冲层与多目标扇出。
//!
//! # 快速开始
//!
//! ```rust
//! use quantum_sink::sinks::{buffer, lock, new_multi_write_syncer, SharedWriteSyncer, WriteSyncer};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = Arc::new(Mutex::new(Vec::<u8>::new()));
//! let mirror = Arc::new(Mutex::new(Vec::<u8>::new()));
//!
//! let fanout = new_multi_write_syncer(vec![
//!     lock(primary.clone()),
//!     lock(mirror.clone()),
//! ]);
//! let (buffered, closer) = buffer(fanout, 0, Duration::from_secs(1))?;
//! let sink: SharedWriteSyncer = Arc::new(buffered);
//!
//! sink.write(b"hello\n")?;
//! closer.close()?;
//!
//! assert_eq!(&*primary.lock(), b"hello\n");
//! assert_eq!(&*mirror.lock(), b"hello\n");
//! # Ok(())
//! # }
//! ```
//!
//! # 按配置初始化
//!
//! ```rust,no_run
//! use quantum_sink::{init_with_config, load_config_from_file};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_from_file(std::path::Path::new("quantum_sink.toml"))?;
//! let handle = init_with_config(&config)?;
//!
//! tracing::info!("Application started");
//!
//! handle.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod diagnostics;
pub mod env_config;
pub mod error;
pub mod sinks;
pub mod subscriber;
pub mod utils;

// 重新导出主要类型
pub use config::{
    load_config_from_file, load_config_from_str, validate_config, BufferConfig, OutputConfig,
    RollingRotation, SinkConfig,
};
pub use diagnostics::BufferStats;
pub use error::{
    MultiError, QuantumSinkError, Result, SinkError, SinkResult, WriteError, WriteResult,
};
pub use sinks::{OpenedSink, SharedWriteSyncer, WriteSyncer};
pub use subscriber::SinkMakeWriter;

use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 全局初始化标记
/// 用于确保全局订阅器只被安装一次
static IS_QUANTUM_SINK_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// 关闭句柄，持有全局订阅器使用的输出
///
/// 调用 [`shutdown`](Self::shutdown) 写出缓冲中的剩余记录；
/// 句柄被直接丢弃时会执行同样的关闭，但忽略错误。
#[derive(Debug)]
pub struct ShutdownHandle {
    opened: Option<OpenedSink>,
}

impl ShutdownHandle {
    /// 当前输出的缓冲层诊断数据
    pub fn buffer_stats(&self) -> Option<BufferStats> {
        self.opened.as_ref().and_then(OpenedSink::stats)
    }

    /// 关闭输出：停止后台刷新并 sync 所有设备
    ///
    /// 全局订阅器无法卸载，关闭后的记录仍会写入设备但不再被缓冲层定时刷新。
    pub fn shutdown(mut self) -> Result<()> {
        match self.opened.take() {
            Some(opened) => opened.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        if let Some(opened) = self.opened.take() {
            let _ = opened.close();
        }
    }
}

/// 检查全局订阅器是否已安装
pub fn is_initialized() -> bool {
    IS_QUANTUM_SINK_INITIALIZED.load(Ordering::SeqCst)
}

/// 按配置打开输出，并安装以其为输出边界的全局 `tracing` 订阅器
///
/// 日志级别过滤读取 `RUST_LOG`，未设置时为 `info`。
/// 配置会先应用环境变量覆盖（见 [`env_config`]）。
///
/// # 错误
///
/// 如果全局订阅器已经安装，将返回错误
pub fn init_with_config(config: &SinkConfig) -> Result<ShutdownHandle> {
    if IS_QUANTUM_SINK_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(QuantumSinkError::InitializationError(
            "QuantumSink has already been initialized".to_string(),
        ));
    }

    let result = install(config);
    if result.is_err() {
        IS_QUANTUM_SINK_INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

/// 使用默认配置（标准输出、加锁、无缓冲）初始化
pub fn init() -> Result<ShutdownHandle> {
    init_with_config(&SinkConfig::default())
}

fn install(config: &SinkConfig) -> Result<ShutdownHandle> {
    let mut config = config.clone();
    env_config::apply_env_overrides(&mut config)?;

    let opened = sinks::open(&config)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(opened.make_writer())
        .with_ansi(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        let _ = opened.close();
        return Err(QuantumSinkError::InitializationError(format!(
            "Failed to install global subscriber: {}",
            e
        )));
    }

    Ok(ShutdownHandle {
        opened: Some(opened),
    })
}
