//! 多目标扇出包装器
//!
//! 把每一次 `write` / `sync` 依次广播给多个 sink，某个目标失败不会阻止对其余目标的尝试，
//! 所有目标的错误都被聚合进同一个错误值返回。

use crate::error::{SinkError, SinkResult, WriteError, WriteResult};
use crate::sinks::traits::{SharedWriteSyncer, WriteSyncer};
use std::fmt;
use std::sync::Arc;

/// 多目标扇出包装器
///
/// 目标序列在构造时复制为自有的不可变切片，调用方之后对原容器的修改不会影响它。
#[derive(Clone)]
pub struct MultiWriteSyncer {
    syncers: Arc<[SharedWriteSyncer]>,
}

impl MultiWriteSyncer {
    /// 创建扇出包装器（不做单目标退化）
    pub fn new<I>(syncers: I) -> Self
    where
        I: IntoIterator<Item = SharedWriteSyncer>,
    {
        Self {
            syncers: syncers.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.syncers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syncers.is_empty()
    }
}

impl WriteSyncer for MultiWriteSyncer {
    /// 依次写入所有目标
    ///
    /// 返回的字节数取第一个非零计数，此后若有更小的计数则替换之，
    /// 调用方应将其视为下界而非逐目标的精确统计。
    fn write(&self, buf: &[u8]) -> WriteResult {
        let mut written = 0;
        let mut error = None;

        for syncer in self.syncers.iter() {
            let (n, err) = match syncer.write(buf) {
                Ok(n) => (n, None),
                Err(e) => (e.written, Some(e.source)),
            };
            error = SinkError::append(error, err);
            if written == 0 && n != 0 {
                written = n;
            } else if n < written {
                written = n;
            }
        }

        match error {
            Some(source) => Err(WriteError::new(written, source)),
            None => Ok(written),
        }
    }

    fn sync(&self) -> SinkResult<()> {
        let mut error = None;
        for syncer in self.syncers.iter() {
            error = SinkError::append(error, syncer.sync().err());
        }
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for MultiWriteSyncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiWriteSyncer")
            .field("destinations", &self.syncers.len())
            .finish()
    }
}

/// 组合多个 sink，写入与 sync 会广播到每一个目标
///
/// 只有一个目标时直接返回该目标本身，不引入包装开销。
/// 传入空序列属于调用方错误：得到的 sink 不写入任何目标，`write` 返回 0。
pub fn new_multi_write_syncer<I>(syncers: I) -> SharedWriteSyncer
where
    I: IntoIterator<Item = SharedWriteSyncer>,
{
    let mut syncers: Vec<SharedWriteSyncer> = syncers.into_iter().collect();
    if syncers.len() == 1 {
        if let Some(only) = syncers.pop() {
            return only;
        }
    }
    Arc::new(MultiWriteSyncer::new(syncers))
}
