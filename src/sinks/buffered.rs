//! 缓冲写入包装器
//!
//! 在内存中累积写入的字节，满足以下任一条件时写出到内部 sink：
//! - 缓冲区放不下新的写入
//! - 后台定时器触发（默认每 30 秒）
//! - 调用方显式 `sync`
//!
//! 构造时会启动一个后台刷新线程，调用方用完后必须通过 [`BufferCloser::close`]
//! 停止该线程并写出剩余的字节。
//!
//! # 使用示例
//!
//! ```rust
//! use quantum_sink::sinks::{buffer, WriteSyncer};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let device = Arc::new(Mutex::new(Vec::<u8>::new()));
//! let (sink, closer) = buffer(device.clone(), 0, Duration::ZERO)?;
//!
//! sink.write(b"buffered record\n")?;
//! assert!(device.lock().is_empty());
//!
//! closer.close()?;
//! assert_eq!(&*device.lock(), b"buffered record\n");
//! # Ok(())
//! # }
//! ```

use crate::config::BufferConfig;
use crate::diagnostics::{BufferStats, Diagnostics};
use crate::error::{Result, SinkError, SinkResult, WriteError, WriteResult};
use crate::sinks::traits::{SharedWriteSyncer, WriteSyncer};
use crossbeam_channel::{select, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// 默认缓冲区大小：256 KiB
pub const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// 默认刷新间隔：30 秒
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(30);

/// 固定容量的写缓冲区
///
/// 保留第一次写出失败的错误：此后所有写入与刷新都返回该错误，
/// 未能写出的字节留在缓冲区中。
struct WriteBuffer<S> {
    inner: S,
    buf: Vec<u8>,
    size: usize,
    err: Option<SinkError>,
}

impl<S: WriteSyncer> WriteBuffer<S> {
    fn new(inner: S, size: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(size),
            size,
            err: None,
        }
    }

    fn available(&self) -> usize {
        self.size.saturating_sub(self.buf.len())
    }

    fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// 把缓冲的字节整体写到内部 sink
    fn flush(&mut self) -> SinkResult<()> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        if self.buf.is_empty() {
            return Ok(());
        }

        let (written, err) = match self.inner.write(&self.buf) {
            Ok(n) if n < self.buf.len() => (n, Some(SinkError::ShortWrite)),
            Ok(n) => (n, None),
            Err(e) => (e.written, Some(e.source)),
        };

        match err {
            Some(err) => {
                let written = written.min(self.buf.len());
                self.buf.drain(..written);
                self.err = Some(err.clone());
                Err(err)
            }
            None => {
                self.buf.clear();
                Ok(())
            }
        }
    }

    /// 追加字节；放不下时先填满并刷新，缓冲区为空时大块写入直接交给内部 sink
    fn write(&mut self, mut data: &[u8]) -> WriteResult {
        let mut accepted = 0;

        while data.len() > self.available() && self.err.is_none() {
            let n = if self.buf.is_empty() {
                match self.inner.write(data) {
                    Ok(0) => {
                        self.err = Some(SinkError::ShortWrite);
                        0
                    }
                    Ok(n) => n.min(data.len()),
                    Err(e) => {
                        self.err = Some(e.source);
                        e.written.min(data.len())
                    }
                }
            } else {
                let n = self.available();
                self.buf.extend_from_slice(&data[..n]);
                // 失败时错误已记录在 self.err 中，循环随之结束
                let _ = self.flush();
                n
            };
            accepted += n;
            data = &data[n..];
        }

        if let Some(err) = &self.err {
            return Err(WriteError::new(accepted, err.clone()));
        }

        self.buf.extend_from_slice(data);
        Ok(accepted + data.len())
    }
}

/// 写缓冲与诊断数据，由包装器句柄与后台刷新线程共享
struct Shared<S> {
    buffer: Mutex<WriteBuffer<S>>,
    flush_interval: Duration,
    diagnostics: Diagnostics,
}

impl<S: WriteSyncer> Shared<S> {
    fn periodic_flush(&self) {
        // 错误由缓冲区保留，在下一次显式 sync 或 close 时返回
        let result = self.buffer.lock().flush();
        self.diagnostics.record_periodic_flush(result.is_err());
    }
}

/// 关闭时的最终刷新，不计入调用方的 sync 次数
trait FinalFlush: Send + Sync {
    fn final_flush(&self) -> SinkResult<()>;
}

impl<S: WriteSyncer> FinalFlush for Shared<S> {
    fn final_flush(&self) -> SinkResult<()> {
        self.buffer.lock().flush()
    }
}

/// 缓冲写入包装器
///
/// 可以廉价克隆，所有克隆共享同一个缓冲区与后台刷新线程。
/// 同一把锁覆盖缓冲区与预刷新判断，写入、sync 与定时刷新彼此互斥。
pub struct BufferedWriteSyncer<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for BufferedWriteSyncer<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: WriteSyncer> BufferedWriteSyncer<S> {
    /// 缓冲区容量
    pub fn capacity(&self) -> usize {
        self.shared.buffer.lock().size
    }

    /// 后台定时刷新的间隔
    pub fn flush_interval(&self) -> Duration {
        self.shared.flush_interval
    }

    /// 当前缓冲中尚未写出的字节数
    pub fn buffered(&self) -> usize {
        self.shared.buffer.lock().buffered()
    }

    /// 获取诊断数据快照
    pub fn stats(&self) -> BufferStats {
        let buffered = self.buffered();
        self.shared.diagnostics.snapshot(buffered)
    }
}

impl<S: WriteSyncer> WriteSyncer for BufferedWriteSyncer<S> {
    fn write(&self, data: &[u8]) -> WriteResult {
        let mut buffer = self.shared.buffer.lock();

        // 新写入放不下且缓冲区非空时，先写出已有数据：
        // 否则本次写入会被拆成两半，前一半与之前的记录一起写出，破坏记录边界。
        // 缓冲区为空时超大写入会被整体直接写出，不存在拆分问题。
        if data.len() > buffer.available() && buffer.buffered() > 0 {
            self.shared.diagnostics.increment_pre_flushes();
            if let Err(err) = buffer.flush() {
                self.shared.diagnostics.record_write(0, true);
                return Err(err.into());
            }
        }

        let result = buffer.write(data);
        drop(buffer);

        match &result {
            Ok(n) => self.shared.diagnostics.record_write(*n, false),
            Err(e) => self.shared.diagnostics.record_write(e.written, true),
        }
        result
    }

    fn sync(&self) -> SinkResult<()> {
        self.shared.diagnostics.increment_syncs();
        self.shared.buffer.lock().flush()
    }
}

impl<S: WriteSyncer> fmt::Debug for BufferedWriteSyncer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.shared.buffer.lock();
        f.debug_struct("BufferedWriteSyncer")
            .field("capacity", &buffer.size)
            .field("flush_interval", &self.shared.flush_interval)
            .field("buffered", &buffer.buffered())
            .field("failed", &buffer.err.is_some())
            .finish()
    }
}

/// 缓冲包装器的关闭句柄
///
/// [`close`](Self::close) 消费句柄本身，因此只能调用一次。
/// 未调用 `close` 就被丢弃时，`Drop` 会执行同样的停止与最终刷新，但丢弃其错误。
pub struct BufferCloser {
    stop: Option<Sender<()>>,
    flusher: Option<JoinHandle<()>>,
    shared: Arc<dyn FinalFlush>,
}

impl BufferCloser {
    /// 停止定时器与后台线程，然后执行最后一次刷新并返回其错误
    ///
    /// 定时刷新的错误只会在这里（或下一次显式 sync）被调用方看到。
    pub fn close(mut self) -> SinkResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> SinkResult<()> {
        // 断开停止通道即通知后台线程退出
        drop(self.stop.take());
        if let Some(flusher) = self.flusher.take() {
            // 后台线程 panic 时仍需执行最终刷新
            let _ = flusher.join();
            debug!("buffered sink flusher stopped");
        }
        self.shared.final_flush()
    }
}

impl Drop for BufferCloser {
    fn drop(&mut self) {
        if self.flusher.is_some() {
            let _ = self.shutdown();
        }
    }
}

impl fmt::Debug for BufferCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferCloser")
            .field("running", &self.flusher.is_some())
            .finish()
    }
}

/// 为 sink 加上缓冲
///
/// `buffer_size` 为 0 时使用 256 KiB，`flush_interval` 为零时使用 30 秒；
/// 除此之外不做任何校验。返回的关闭句柄必须在用完后调用。
///
/// 对已经缓冲过的 sink 再次缓冲属于调用方错误，此处不做检查。
pub fn buffer<S>(
    sink: S,
    buffer_size: usize,
    flush_interval: Duration,
) -> Result<(BufferedWriteSyncer<S>, BufferCloser)>
where
    S: WriteSyncer + 'static,
{
    let buffer_size = if buffer_size == 0 {
        DEFAULT_BUFFER_SIZE
    } else {
        buffer_size
    };
    let flush_interval = if flush_interval.is_zero() {
        DEFAULT_FLUSH_INTERVAL
    } else {
        flush_interval
    };

    let shared = Arc::new(Shared {
        buffer: Mutex::new(WriteBuffer::new(sink, buffer_size)),
        flush_interval,
        diagnostics: Diagnostics::new(),
    });

    let ticker = crossbeam_channel::tick(flush_interval);
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);

    let worker = Arc::clone(&shared);
    let flusher = thread::Builder::new()
        .name("quantum-sink-flusher".to_string())
        .spawn(move || flush_loop(worker, ticker, stop_rx))?;

    debug!(
        buffer_size,
        flush_interval_ms = flush_interval.as_millis() as u64,
        "buffered sink flusher started"
    );

    let closer = BufferCloser {
        stop: Some(stop_tx),
        flusher: Some(flusher),
        shared: Arc::clone(&shared) as Arc<dyn FinalFlush>,
    };
    let buffered = BufferedWriteSyncer { shared };

    Ok((buffered, closer))
}

/// 按配置为 sink 加上缓冲
pub fn buffer_with_config<S>(
    sink: S,
    config: &BufferConfig,
) -> Result<(BufferedWriteSyncer<S>, BufferCloser)>
where
    S: WriteSyncer + 'static,
{
    buffer(sink, config.buffer_size, config.flush_interval())
}

/// 后台刷新循环：定时器与停止信号先到者唤醒
fn flush_loop<S: WriteSyncer>(
    shared: Arc<Shared<S>>,
    ticker: Receiver<Instant>,
    stop: Receiver<()>,
) {
    loop {
        select! {
            recv(ticker) -> _ => shared.periodic_flush(),
            recv(stop) -> _ => return,
        }
    }
}
