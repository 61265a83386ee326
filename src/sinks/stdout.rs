//! 进程级标准输出 / 标准错误 sink
//!
//! 整个进程共享同一个已加锁的句柄：所有通过这里写入标准输出的组合 sink
//! 共用一把锁，多个输出配置同时指向 stdout 时记录也不会交错。

use crate::sinks::locked::Locked;
use crate::sinks::traits::SharedWriteSyncer;
use once_cell::sync::Lazy;
use std::io;
use std::sync::Arc;

static STDOUT: Lazy<SharedWriteSyncer> = Lazy::new(|| Arc::new(Locked::new(io::stdout())));

static STDERR: Lazy<SharedWriteSyncer> = Lazy::new(|| Arc::new(Locked::new(io::stderr())));

/// 进程共享的标准输出 sink
pub fn stdout() -> SharedWriteSyncer {
    Arc::clone(&STDOUT)
}

/// 进程共享的标准错误 sink
pub fn stderr() -> SharedWriteSyncer {
    Arc::clone(&STDERR)
}
