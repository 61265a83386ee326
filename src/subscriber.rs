//! 与 `tracing-subscriber` 的集成
//!
//! [`SinkMakeWriter`] 让 fmt 层把格式化好的事件直接交给组合好的 sink：
//!
//! ```rust
//! use quantum_sink::sinks::{lock, SharedWriteSyncer};
//! use quantum_sink::subscriber::SinkMakeWriter;
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let records = Arc::new(Mutex::new(Vec::<u8>::new()));
//! let sink: SharedWriteSyncer = lock(records.clone());
//!
//! let subscriber = tracing_subscriber::fmt()
//!     .with_writer(SinkMakeWriter::new(sink))
//!     .with_ansi(false)
//!     .finish();
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     tracing::info!("hello");
//! });
//! assert!(String::from_utf8_lossy(&records.lock()).contains("hello"));
//! ```

use crate::sinks::traits::{IoWriter, SharedWriteSyncer};
use std::fmt;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// 基于共享 sink 的写入器工厂
///
/// 每个事件取得一个转发到同一 sink 的 [`IoWriter`]；
/// 事件的格式化结果以一次 `write` 交给 sink，因此记录不会被拆分。
#[derive(Clone)]
pub struct SinkMakeWriter {
    sink: SharedWriteSyncer,
}

impl SinkMakeWriter {
    pub fn new(sink: SharedWriteSyncer) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> SharedWriteSyncer {
        Arc::clone(&self.sink)
    }
}

impl From<SharedWriteSyncer> for SinkMakeWriter {
    fn from(sink: SharedWriteSyncer) -> Self {
        Self::new(sink)
    }
}

impl<'a> MakeWriter<'a> for SinkMakeWriter {
    type Writer = IoWriter<SharedWriteSyncer>;

    fn make_writer(&'a self) -> Self::Writer {
        IoWriter::new(Arc::clone(&self.sink))
    }
}

impl fmt::Debug for SinkMakeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkMakeWriter")
            .field("locked", &self.sink.is_locked())
            .finish()
    }
}
