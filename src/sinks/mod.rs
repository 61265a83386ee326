//! QuantumSink Sinks 模块
//!
//! 提供统一的 `WriteSyncer` 接口及其组合包装器：
//!
//! - `add_sync`: 把只会写入的目标适配为 `WriteSyncer`
//! - `lock`: 独占访问包装器
//! - `buffer`: 带后台定时刷新的缓冲包装器
//! - `new_multi_write_syncer`: 多目标扇出
//! - `open`: 按配置打开并组合输出目标

pub mod add_sync;
pub mod buffered;
pub mod locked;
pub mod multi;
pub mod open;
pub mod stdout;
pub mod traits;

// 重新导出主要类型
pub use add_sync::{add_sync, AddSync};
pub use buffered::{
    buffer, buffer_with_config, BufferCloser, BufferedWriteSyncer, DEFAULT_BUFFER_SIZE,
    DEFAULT_FLUSH_INTERVAL,
};
pub use locked::{lock, Locked};
pub use multi::{new_multi_write_syncer, MultiWriteSyncer};
pub use open::{open, open_output, OpenedSink};
pub use stdout::{stderr, stdout};
pub use traits::{IoWriter, SharedWriteSyncer, WriteSyncer};
