//! 环境变量配置模块
//!
//! 此模块提供从环境变量覆盖缓冲层配置的功能，覆盖在已加载的配置之上生效。

use crate::config::{BufferConfig, SinkConfig};
use crate::error::{QuantumSinkError, Result};
use std::env;
use std::str::FromStr;

/// 缓冲区大小（字节）
pub const BUFFER_SIZE_VAR: &str = "QUANTUM_SINK_BUFFER_SIZE";

/// 刷新间隔（毫秒）
pub const FLUSH_INTERVAL_MS_VAR: &str = "QUANTUM_SINK_FLUSH_INTERVAL_MS";

/// 环境变量配置管理器
pub struct EnvConfig;

impl EnvConfig {
    /// 从环境变量读取缓冲区大小
    pub fn get_buffer_size() -> Result<Option<usize>> {
        Self::parse_var(BUFFER_SIZE_VAR)
    }

    /// 从环境变量读取刷新间隔
    pub fn get_flush_interval_ms() -> Result<Option<u64>> {
        Self::parse_var(FLUSH_INTERVAL_MS_VAR)
    }

    fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
        let value = match env::var(name) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => return Ok(None),
        };

        value.trim().parse::<T>().map(Some).map_err(|_| {
            QuantumSinkError::config(format!("环境变量 {} 的值无效: {}", name, value))
        })
    }
}

/// 把环境变量中的设置覆盖到配置上
///
/// 任一缓冲变量存在时，即使配置中没有 `[buffer]` 段也会启用缓冲。
pub fn apply_env_overrides(config: &mut SinkConfig) -> Result<()> {
    let buffer_size = EnvConfig::get_buffer_size()?;
    let flush_interval_ms = EnvConfig::get_flush_interval_ms()?;

    if buffer_size.is_none() && flush_interval_ms.is_none() {
        return Ok(());
    }

    let buffer = config.buffer.get_or_insert_with(BufferConfig::default);
    if let Some(size) = buffer_size {
        buffer.buffer_size = size;
    }
    if let Some(interval) = flush_interval_ms {
        buffer.flush_interval_ms = interval;
    }

    Ok(())
}
