//! 按配置打开并组合输出目标
//!
//! 组合顺序固定为：设备（按需加锁）→ 扇出 → 缓冲。
//! 标准输出与标准错误使用进程共享的句柄，文件以追加模式打开，
//! 滚动文件交给 `tracing-appender` 负责切分。

use crate::config::{OutputConfig, SinkConfig};
use crate::diagnostics::BufferStats;
use crate::error::{QuantumSinkError, Result, SinkError};
use crate::sinks::buffered::{buffer_with_config, BufferCloser, BufferedWriteSyncer};
use crate::sinks::locked::lock;
use crate::sinks::multi::new_multi_write_syncer;
use crate::sinks::stdout::{stderr, stdout};
use crate::sinks::traits::{SharedWriteSyncer, WriteSyncer};
use crate::subscriber::SinkMakeWriter;
use crate::utils::FileTools;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use tracing_appender::rolling::RollingFileAppender;

/// 按配置组合好的 sink 及其关闭句柄
pub struct OpenedSink {
    sink: SharedWriteSyncer,
    devices: SharedWriteSyncer,
    buffered: Option<BufferedWriteSyncer<SharedWriteSyncer>>,
    closer: Option<BufferCloser>,
}

impl OpenedSink {
    /// 组合后的最外层 sink
    pub fn sink(&self) -> SharedWriteSyncer {
        Arc::clone(&self.sink)
    }

    /// 供 `tracing-subscriber` 使用的写入器工厂
    pub fn make_writer(&self) -> SinkMakeWriter {
        SinkMakeWriter::new(self.sink())
    }

    /// 是否启用了缓冲层
    pub fn is_buffered(&self) -> bool {
        self.buffered.is_some()
    }

    /// 缓冲层的诊断数据；未启用缓冲时返回 `None`
    pub fn stats(&self) -> Option<BufferStats> {
        self.buffered.as_ref().map(BufferedWriteSyncer::stats)
    }

    /// 关闭缓冲层（如有），然后 sync 所有设备
    ///
    /// 两步的错误都会被收集，前一步失败不影响后一步执行。
    pub fn close(mut self) -> Result<()> {
        let mut error = None;
        if let Some(closer) = self.closer.take() {
            error = SinkError::append(error, closer.close().err());
        }
        error = SinkError::append(error, self.devices.sync().err());

        match error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for OpenedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedSink")
            .field("buffered", &self.buffered)
            .field("closer", &self.closer)
            .finish()
    }
}

/// 打开单个输出目标
///
/// `lock` 为 `true` 时保证返回的 sink 可以被并发安全地使用。
pub fn open_output(output: &OutputConfig, lock_output: bool) -> Result<SharedWriteSyncer> {
    let sink: SharedWriteSyncer = match output {
        OutputConfig::Stdout => stdout(),
        OutputConfig::Stderr => stderr(),
        OutputConfig::File { path, create_dirs } => {
            let file = FileTools::open_file_append(path, *create_dirs)?;
            debug!(path = %path.display(), "opened file output");
            Arc::new(file) as SharedWriteSyncer
        }
        OutputConfig::RollingFile {
            directory,
            prefix,
            rotation,
        } => {
            FileTools::ensure_directory_exists(directory)?;
            if !FileTools::is_directory_writable(directory) {
                return Err(QuantumSinkError::invalid_path(format!(
                    "目录不可写: {}",
                    directory.display()
                )));
            }
            let appender = RollingFileAppender::builder()
                .rotation((*rotation).into())
                .filename_prefix(prefix.as_str())
                .build(directory)?;
            debug!(
                directory = %directory.display(),
                prefix = %prefix,
                ?rotation,
                "opened rolling file output"
            );
            Arc::new(Mutex::new(appender)) as SharedWriteSyncer
        }
    };

    Ok(if lock_output { lock(sink) } else { sink })
}

/// 按配置打开所有输出并组合成一个 sink
///
/// 配置会先经过校验；任一输出打开失败时整体失败。
pub fn open(config: &SinkConfig) -> Result<OpenedSink> {
    crate::config::validate_config(config)?;

    let outputs = config
        .outputs
        .iter()
        .map(|output| open_output(output, config.lock))
        .collect::<Result<Vec<_>>>()?;
    let count = outputs.len();
    let devices = new_multi_write_syncer(outputs);

    let opened = match &config.buffer {
        Some(buffer_config) => {
            let (buffered, closer) = buffer_with_config(Arc::clone(&devices), buffer_config)?;
            OpenedSink {
                sink: Arc::new(buffered.clone()),
                devices,
                buffered: Some(buffered),
                closer: Some(closer),
            }
        }
        None => OpenedSink {
            sink: Arc::clone(&devices),
            devices,
            buffered: None,
            closer: None,
        },
    };

    debug!(
        outputs = count,
        lock = config.lock,
        buffered = opened.is_buffered(),
        "sink opened"
    );
    Ok(opened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BufferConfig, RollingRotation};
    use std::fs;
    use tempfile::TempDir;

    fn file_output(path: std::path::PathBuf) -> OutputConfig {
        OutputConfig::File {
            path,
            create_dirs: true,
        }
    }

    #[test]
    fn test_open_single_file_unbuffered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let config = SinkConfig {
            outputs: vec![file_output(path.clone())],
            lock: true,
            buffer: None,
        };

        let opened = open(&config).unwrap();
        assert!(!opened.is_buffered());
        assert!(opened.stats().is_none());
        assert!(opened.sink().is_locked());

        opened.sink().write(b"direct\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "direct\n");
        opened.close().unwrap();
    }

    #[test]
    fn test_open_buffered_fanout() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");
        let config = SinkConfig {
            outputs: vec![file_output(first.clone()), file_output(second.clone())],
            lock: true,
            buffer: Some(BufferConfig {
                buffer_size: 1024,
                flush_interval_ms: 60_000,
            }),
        };

        let opened = open(&config).unwrap();
        let sink = opened.sink();
        sink.write(b"one\n").unwrap();
        sink.write(b"two\n").unwrap();

        assert_eq!(fs::read_to_string(&first).unwrap(), "");
        assert_eq!(opened.stats().unwrap().buffered_bytes, 8);

        opened.close().unwrap();
        assert_eq!(fs::read_to_string(&first).unwrap(), "one\ntwo\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_open_rolling_file() {
        let dir = TempDir::new().unwrap();
        let config = SinkConfig {
            outputs: vec![OutputConfig::RollingFile {
                directory: dir.path().join("rolling"),
                prefix: "app.log".to_string(),
                rotation: RollingRotation::Never,
            }],
            lock: true,
            buffer: None,
        };

        let opened = open(&config).unwrap();
        opened.sink().write(b"rolled\n").unwrap();
        opened.close().unwrap();

        let contents = fs::read_to_string(dir.path().join("rolling").join("app.log")).unwrap();
        assert_eq!(contents, "rolled\n");
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = SinkConfig {
            outputs: Vec::new(),
            lock: true,
            buffer: None,
        };
        assert!(matches!(
            open(&config),
            Err(QuantumSinkError::ValidationError(_))
        ));
    }

    #[test]
    fn test_open_rejects_oversized_buffer() {
        let dir = TempDir::new().unwrap();
        let config = SinkConfig {
            outputs: vec![file_output(dir.path().join("huge.log"))],
            lock: true,
            buffer: Some(BufferConfig {
                buffer_size: 99_999_999_999_999,
                flush_interval_ms: 0,
            }),
        };
        assert!(matches!(
            open(&config),
            Err(QuantumSinkError::ValidationError(_))
        ));
        assert!(!dir.path().join("huge.log").exists());
    }

    // /dev/full 的每次写入都返回 ENOSPC
    #[cfg(target_os = "linux")]
    #[test]
    fn test_close_aggregates_buffer_and_device_errors() {
        let config = SinkConfig {
            outputs: vec![OutputConfig::File {
                path: std::path::PathBuf::from("/dev/full"),
                create_dirs: false,
            }],
            lock: true,
            buffer: Some(BufferConfig {
                buffer_size: 1024,
                flush_interval_ms: 60_000,
            }),
        };
        let opened = open(&config).unwrap();
        assert_eq!(opened.sink().write(b"doomed\n").unwrap(), 7);

        match opened.close() {
            Err(QuantumSinkError::SinkError {
                source: SinkError::Multiple(multi),
            }) => assert_eq!(multi.len(), 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_open_output_without_lock() {
        let dir = TempDir::new().unwrap();
        let sink = open_output(&file_output(dir.path().join("raw.log")), false).unwrap();
        assert!(!sink.is_locked());

        let sink = open_output(&file_output(dir.path().join("raw.log")), true).unwrap();
        assert!(sink.is_locked());
    }

    #[test]
    fn test_open_output_file_in_missing_dir_without_create() {
        let dir = TempDir::new().unwrap();
        let output = OutputConfig::File {
            path: dir.path().join("missing").join("app.log"),
            create_dirs: false,
        };
        let err = open_output(&output, true).err().unwrap();
        assert_eq!(err.category(), "io");
    }
}
