//! 定义 QuantumSink 缓冲包装器的内部诊断与指标。
//!
//! sink 核心不记录自身的失败（否则会经由同一条日志管道递归），
//! 因此周期性刷新中被丢弃的错误等信息只以计数器的形式对外暴露。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 内部诊断与指标数据结构。
///
/// 使用原子操作确保线程安全；写入路径只做 `Relaxed` 自增。
#[derive(Debug)]
pub struct Diagnostics {
    /// 创建时间
    start_time: Instant,

    /// 写入调用次数
    writes: AtomicU64,

    /// 被缓冲层接受的字节数
    bytes_accepted: AtomicU64,

    /// 失败的写入调用次数
    write_errors: AtomicU64,

    /// 调用方显式 sync 次数
    syncs: AtomicU64,

    /// 为避免拆分写入而执行的预刷新次数
    pre_flushes: AtomicU64,

    /// 定时器触发的刷新次数
    periodic_flushes: AtomicU64,

    /// 定时刷新中被丢弃的错误数
    periodic_flush_errors: AtomicU64,
}

/// 诊断数据的快照，用于外部查询。
#[derive(Debug, Clone, PartialEq)]
pub struct BufferStats {
    /// 运行时间
    pub uptime: Duration,

    /// 写入调用次数
    pub writes: u64,

    /// 被缓冲层接受的字节数
    pub bytes_accepted: u64,

    /// 失败的写入调用次数
    pub write_errors: u64,

    /// 显式 sync 次数
    pub syncs: u64,

    /// 预刷新次数
    pub pre_flushes: u64,

    /// 定时刷新次数
    pub periodic_flushes: u64,

    /// 定时刷新中被丢弃的错误数
    pub periodic_flush_errors: u64,

    /// 当前缓冲中尚未写出的字节数
    pub buffered_bytes: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    /// 创建新的诊断实例。
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            writes: AtomicU64::new(0),
            bytes_accepted: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            syncs: AtomicU64::new(0),
            pre_flushes: AtomicU64::new(0),
            periodic_flushes: AtomicU64::new(0),
            periodic_flush_errors: AtomicU64::new(0),
        }
    }

    /// 记录一次写入及其接受的字节数。
    pub fn record_write(&self, accepted: usize, failed: bool) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_accepted
            .fetch_add(accepted as u64, Ordering::Relaxed);
        if failed {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 增加显式 sync 计数。
    pub fn increment_syncs(&self) {
        self.syncs.fetch_add(1, Ordering::Relaxed);
    }

    /// 增加预刷新计数。
    pub fn increment_pre_flushes(&self) {
        self.pre_flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录一次定时刷新。
    pub fn record_periodic_flush(&self, failed: bool) {
        self.periodic_flushes.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.periodic_flush_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 获取诊断数据的快照。
    pub fn snapshot(&self, buffered_bytes: usize) -> BufferStats {
        BufferStats {
            uptime: self.start_time.elapsed(),
            writes: self.writes.load(Ordering::Relaxed),
            bytes_accepted: self.bytes_accepted.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            syncs: self.syncs.load(Ordering::Relaxed),
            pre_flushes: self.pre_flushes.load(Ordering::Relaxed),
            periodic_flushes: self.periodic_flushes.load(Ordering::Relaxed),
            periodic_flush_errors: self.periodic_flush_errors.load(Ordering::Relaxed),
            buffered_bytes,
        }
    }
}
