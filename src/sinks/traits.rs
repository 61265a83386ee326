//! QuantumSink Sink Traits
//!
//! 定义统一的 `WriteSyncer` 接口：所有日志输出目标都只需要两个能力，
//! 写入字节 (`write`) 与把内部缓冲的字节刷到底层介质 (`sync`)。
//!
//! # 架构设计
//!
//! - `WriteSyncer`: 基础 trait，方法均为 `&self`，一个 sink 可以被多个生产者共享
//! - `SharedWriteSyncer`: `Arc<dyn WriteSyncer>`，组合后的 sink 通常以此形式传递
//! - 包装器（`Locked`、`BufferedWriteSyncer`、`MultiWriteSyncer`）自身也实现 `WriteSyncer`，
//!   调用方无需关心下面嵌套了几层
//!
//! # 使用示例
//!
//! ```rust
//! use quantum_sink::sinks::traits::WriteSyncer;
//! use quantum_sink::{WriteResult, SinkResult};
//!
//! #[derive(Debug, Default)]
//! struct CountingSink {
//!     bytes: std::sync::atomic::AtomicUsize,
//! }
//!
//! impl WriteSyncer for CountingSink {
//!     fn write(&self, buf: &[u8]) -> WriteResult {
//!         self.bytes.fetch_add(buf.len(), std::sync::atomic::Ordering::Relaxed);
//!         Ok(buf.len())
//!     }
//!
//!     fn sync(&self) -> SinkResult<()> {
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::{SinkError, SinkResult, WriteError, WriteResult};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Stderr, Stdout, Write};
use std::sync::Arc;

/// 基础 Sink trait
///
/// 所有日志输出目标与包装器都实现此 trait。方法接收 `&self`，
/// 因此实现者需要自行保证并发安全（或者交给 [`lock`](crate::sinks::lock) 串行化）。
pub trait WriteSyncer: Send + Sync {
    /// 写入一段字节
    ///
    /// 成功时返回被接受的字节数；失败时 [`WriteError`] 中携带失败前已接受的字节数。
    fn write(&self, buf: &[u8]) -> WriteResult;

    /// 将内部缓冲的字节刷到底层介质
    fn sync(&self) -> SinkResult<()>;

    /// 是否已经是独占访问包装器
    ///
    /// [`Locked`](crate::sinks::Locked) 与 `Mutex<W>` 返回 `true`，`lock` 据此避免重复加锁。
    fn is_locked(&self) -> bool {
        false
    }
}

/// 共享的 sink 句柄
pub type SharedWriteSyncer = Arc<dyn WriteSyncer>;

impl<T: WriteSyncer + ?Sized> WriteSyncer for Arc<T> {
    fn write(&self, buf: &[u8]) -> WriteResult {
        (**self).write(buf)
    }

    fn sync(&self) -> SinkResult<()> {
        (**self).sync()
    }

    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }
}

impl<T: WriteSyncer + ?Sized> WriteSyncer for Box<T> {
    fn write(&self, buf: &[u8]) -> WriteResult {
        (**self).write(buf)
    }

    fn sync(&self) -> SinkResult<()> {
        (**self).sync()
    }

    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }
}

impl<T: WriteSyncer + ?Sized> WriteSyncer for &T {
    fn write(&self, buf: &[u8]) -> WriteResult {
        (**self).write(buf)
    }

    fn sync(&self) -> SinkResult<()> {
        (**self).sync()
    }

    fn is_locked(&self) -> bool {
        (**self).is_locked()
    }
}

/// 文件：`sync` 对应 fsync
impl WriteSyncer for File {
    fn write(&self, buf: &[u8]) -> WriteResult {
        write_once(self, buf)
    }

    fn sync(&self) -> SinkResult<()> {
        self.sync_all().map_err(SinkError::from)
    }
}

/// 标准输出：`sync` 刷新 std 内部的行缓冲
impl WriteSyncer for Stdout {
    fn write(&self, buf: &[u8]) -> WriteResult {
        write_once(self, buf)
    }

    fn sync(&self) -> SinkResult<()> {
        let mut handle: &Stdout = self;
        handle.flush().map_err(SinkError::from)
    }
}

impl WriteSyncer for Stderr {
    fn write(&self, buf: &[u8]) -> WriteResult {
        write_once(self, buf)
    }

    fn sync(&self) -> SinkResult<()> {
        let mut handle: &Stderr = self;
        handle.flush().map_err(SinkError::from)
    }
}

/// 持有独占写入器的互斥锁本身就是一个已加锁的 sink，`sync` 对应 `flush`
///
/// 适用于只能通过 `&mut` 写入的目标（`Vec<u8>`、`BufWriter`、滚动文件等）。
impl<W: Write + Send> WriteSyncer for Mutex<W> {
    fn write(&self, buf: &[u8]) -> WriteResult {
        let mut writer = self.lock();
        write_once(&mut *writer, buf)
    }

    fn sync(&self) -> SinkResult<()> {
        self.lock().flush().map_err(SinkError::from)
    }

    fn is_locked(&self) -> bool {
        true
    }
}

/// 对写入器执行一次完整写入，返回已写入字节数
///
/// 与 `write_all` 相同地重试 `Interrupted`，出错时保留已写入的部分计数。
pub(crate) fn write_once<W: Write>(mut writer: W, buf: &[u8]) -> WriteResult {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => return Err(WriteError::new(written, SinkError::ShortWrite)),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(WriteError::new(written, e.into())),
        }
    }
    Ok(written)
}

/// 把 `WriteSyncer` 视为 `io::Write` 的适配器
///
/// `write` 转发到 `WriteSyncer::write`，`flush` 转发到 `WriteSyncer::sync`。
///
/// 注意：与 `io::Write` 的约定不同，`write` 返回 `Err` 时部分字节可能已经写出
/// （例如扇出中只有一个目标失败）。此时错误内部携带原始的 [`WriteError`]，
/// 可以通过 `get_ref` + `downcast_ref` 取回已写入的字节数。
#[derive(Debug, Clone)]
pub struct IoWriter<S> {
    sink: S,
}

impl<S: WriteSyncer> IoWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: WriteSyncer> Write for IoWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink.write(buf).map_err(|err| {
            if err.written == 0 {
                return io::Error::from(err);
            }
            let kind = err.source.io_kind().unwrap_or(io::ErrorKind::Other);
            io::Error::new(kind, err)
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.sync().map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    /// 每次只接受有限字节的写入器
    struct Trickle {
        data: Vec<u8>,
        step: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.step);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Full;

    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("flush failed"))
        }
    }

    #[test]
    fn test_mutex_writer_sink() {
        let sink = Mutex::new(Vec::new());
        assert_eq!(sink.write(b"hello ").unwrap(), 6);
        assert_eq!(sink.write(b"world").unwrap(), 5);
        assert!(sink.sync().is_ok());
        assert_eq!(&*sink.lock(), b"hello world");
        assert!(WriteSyncer::is_locked(&sink));
    }

    #[test]
    fn test_write_once_loops_over_short_writes() {
        let sink = Mutex::new(Trickle {
            data: Vec::new(),
            step: 3,
        });
        assert_eq!(sink.write(b"abcdefgh").unwrap(), 8);
        assert_eq!(sink.lock().data, b"abcdefgh");
    }

    #[test]
    fn test_write_zero_is_short_write() {
        let sink = Mutex::new(Full);
        let err = sink.write(b"abc").unwrap_err();
        assert_eq!(err.written, 0);
        assert!(matches!(err.source, SinkError::ShortWrite));
        assert!(sink.sync().is_err());
    }

    #[test]
    fn test_file_sink() {
        let mut file = NamedTempFile::new().unwrap();
        let handle = file.reopen().unwrap();

        assert_eq!(WriteSyncer::write(&handle, b"line\n").unwrap(), 5);
        assert!(WriteSyncer::sync(&handle).is_ok());

        let mut contents = String::new();
        file.as_file_mut().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "line\n");
    }

    #[test]
    fn test_smart_pointers_delegate() {
        let shared: SharedWriteSyncer = Arc::new(Mutex::new(Vec::new()));
        let boxed: Box<dyn WriteSyncer> = Box::new(shared.clone());
        boxed.write(b"via box").unwrap();
        let by_ref: &dyn WriteSyncer = &*shared;
        by_ref.write(b" via ref").unwrap();
        shared.sync().unwrap();
        assert!(boxed.is_locked());

        let inner = Mutex::new(Vec::new());
        {
            let borrowed = &inner;
            WriteSyncer::write(&borrowed, b"borrowed").unwrap();
        }
        assert_eq!(&*inner.lock(), b"borrowed");
    }

    #[test]
    fn test_io_writer_adapter() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let mut writer = IoWriter::new(sink.clone());
        writeln!(writer, "{}={}", "key", 42).unwrap();
        writer.flush().unwrap();
        assert_eq!(&*sink.lock(), b"key=42\n");

        let inner = writer.into_inner();
        assert!(Arc::ptr_eq(&inner, &sink));
    }

    #[test]
    fn test_io_writer_keeps_partial_count() {
        // 接受 2 字节后失败
        struct Partial;

        impl WriteSyncer for Partial {
            fn write(&self, _buf: &[u8]) -> WriteResult {
                Err(WriteError::new(
                    2,
                    io::Error::new(io::ErrorKind::BrokenPipe, "leg failed").into(),
                ))
            }

            fn sync(&self) -> SinkResult<()> {
                Ok(())
            }
        }

        let mut writer = IoWriter::new(Partial);
        let err = writer.write(b"abcd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        let inner = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<WriteError>())
            .unwrap();
        assert_eq!(inner.written, 2);
    }

    #[test]
    fn test_io_writer_maps_errors() {
        let mut writer = IoWriter::new(Mutex::new(Full));
        let err = writer.write(b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        assert!(writer.flush().is_err());
    }
}
