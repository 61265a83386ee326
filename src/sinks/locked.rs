//! 独占访问包装器
//!
//! 用互斥锁串行化对内部 sink 的所有 `write` / `sync` 调用，
//! 同一时刻最多只有一个操作作用在内部 sink 上。

use crate::error::{SinkResult, WriteResult};
use crate::sinks::traits::{SharedWriteSyncer, WriteSyncer};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// 独占访问包装器
///
/// 内部 sink 的错误原样返回，包装器不引入新的错误类型。
pub struct Locked<S> {
    inner: Mutex<S>,
}

impl<S: WriteSyncer> Locked<S> {
    /// 用新的互斥锁包装 sink
    ///
    /// 静态类型下不做去重；需要幂等包装时使用 [`lock`]。
    pub fn new(inner: S) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

impl<S: WriteSyncer> WriteSyncer for Locked<S> {
    fn write(&self, buf: &[u8]) -> WriteResult {
        self.inner.lock().write(buf)
    }

    fn sync(&self) -> SinkResult<()> {
        self.inner.lock().sync()
    }

    fn is_locked(&self) -> bool {
        true
    }
}

impl<S> fmt::Debug for Locked<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locked")
            .field("contended", &self.inner.is_locked())
            .finish()
    }
}

/// 为共享 sink 加锁，使其可以安全地被并发使用
///
/// 如果 `sink` 已经是独占访问包装器，则原样返回同一个 `Arc`，避免锁嵌套。
pub fn lock(sink: SharedWriteSyncer) -> SharedWriteSyncer {
    if sink.is_locked() {
        return sink;
    }
    Arc::new(Locked::new(sink))
}
