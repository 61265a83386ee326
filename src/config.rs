//! 定义 QuantumSink 输出组合的所有配置结构体。

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::rolling::Rotation;

// --- 辅助函数，用于提供配置项的默认值 ---
fn default_true() -> bool {
    true
}
fn default_rolling_prefix() -> String {
    "quantum".to_string()
}

/// 缓冲区大小上限（1 GiB）
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// 缓冲层配置。
///
/// 两个字段为 0 时分别使用 256 KiB 与 30 秒的默认值。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BufferConfig {
    #[serde(default)]
    pub buffer_size: usize,
    #[serde(default)]
    pub flush_interval_ms: u64,
}

impl BufferConfig {
    /// 刷新间隔
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

/// 滚动文件的切分周期。
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollingRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<RollingRotation> for Rotation {
    fn from(rotation: RollingRotation) -> Self {
        match rotation {
            RollingRotation::Minutely => Rotation::MINUTELY,
            RollingRotation::Hourly => Rotation::HOURLY,
            RollingRotation::Daily => Rotation::DAILY,
            RollingRotation::Never => Rotation::NEVER,
        }
    }
}

/// 单个输出目标的配置。
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", deny_unknown_fields)]
pub enum OutputConfig {
    /// 进程标准输出
    Stdout,
    /// 进程标准错误
    Stderr,
    /// 追加写入的普通文件
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        create_dirs: bool,
    },
    /// 按时间切分的滚动文件
    RollingFile {
        directory: PathBuf,
        #[serde(default = "default_rolling_prefix")]
        prefix: String,
        #[serde(default)]
        rotation: RollingRotation,
    },
}

/// QuantumSink 的顶层配置结构体。
///
/// ```toml
/// lock = true
///
/// [[outputs]]
/// type = "Stderr"
///
/// [[outputs]]
/// type = "File"
/// path = "logs/app.log"
///
/// [buffer]
/// buffer_size = 65536
/// flush_interval_ms = 1000
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
    /// 是否为每个输出加独占访问包装
    #[serde(default = "default_true")]
    pub lock: bool,
    pub buffer: Option<BufferConfig>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            outputs: vec![OutputConfig::Stdout],
            lock: default_true(),
            buffer: None,
        }
    }
}

/// 用于从文件加载 `SinkConfig` 的辅助函数。
pub fn load_config_from_file(path: &std::path::Path) -> crate::error::Result<SinkConfig> {
    use crate::error::QuantumSinkError;
    use std::fs;

    if !path.exists() {
        return Err(QuantumSinkError::ConfigFileMissing(
            path.to_string_lossy().into_owned(),
        ));
    }

    let config_str = fs::read_to_string(path)?;
    load_config_from_str(&config_str)
}

/// 用于从 TOML 字符串加载 `SinkConfig` 的辅助函数。
pub fn load_config_from_str(config_str: &str) -> crate::error::Result<SinkConfig> {
    let config: SinkConfig = toml::from_str(config_str)?;
    Ok(config)
}

/// 验证配置的有效性。
pub fn validate_config(config: &SinkConfig) -> crate::error::Result<()> {
    use crate::error::QuantumSinkError;

    if config.outputs.is_empty() {
        return Err(QuantumSinkError::validation("至少需要配置一个输出目标"));
    }

    if let Some(buffer) = &config.buffer {
        if buffer.buffer_size > MAX_BUFFER_SIZE {
            return Err(QuantumSinkError::validation(format!(
                "缓冲区大小不能超过 {} 字节: {}",
                MAX_BUFFER_SIZE, buffer.buffer_size
            )));
        }
    }

    for output in &config.outputs {
        match output {
            OutputConfig::Stdout | OutputConfig::Stderr => {}
            OutputConfig::File { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(QuantumSinkError::invalid_path("文件输出路径不能为空"));
                }
            }
            OutputConfig::RollingFile {
                directory, prefix, ..
            } => {
                if directory.as_os_str().is_empty() {
                    return Err(QuantumSinkError::invalid_path("滚动文件目录不能为空"));
                }
                if prefix.is_empty() {
                    return Err(QuantumSinkError::validation("滚动文件前缀不能为空"));
                }
            }
        }
    }

    Ok(())
}
