//! 无刷新能力写入目标的适配器
//!
//! 许多写入目标（socket、管道、`io::sink()` 等）只能写入字节，没有“刷新”的概念。
//! [`add_sync`] 为它们补上一个永远成功的空 `sync`，使其满足 [`WriteSyncer`] 接口。
//!
//! 已经实现 `WriteSyncer` 的目标（文件、标准输出、本 crate 的所有包装器）
//! 直接使用即可，不需要也不应该再经过此适配器。

use crate::error::{SinkResult, WriteResult};
use crate::sinks::traits::{write_once, WriteSyncer};
use std::io::{self, Write};

/// 为只读写目标补充空 `sync` 的适配器
///
/// 要求 `&W: io::Write`，即目标本身可以通过共享引用并发写入
/// （例如 `TcpStream`、`UnixStream`、`File`、`io::Sink`）。
/// 只能通过 `&mut` 写入的目标请使用 `parking_lot::Mutex<W>`。
#[derive(Debug, Clone, Default)]
pub struct AddSync<W> {
    writer: W,
}

/// 将写入目标适配为 `WriteSyncer`，其 `sync` 为空操作
pub fn add_sync<W>(writer: W) -> AddSync<W>
where
    W: Send + Sync,
    for<'a> &'a W: Write,
{
    AddSync { writer }
}

impl<W> AddSync<W> {
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> WriteSyncer for AddSync<W>
where
    W: Send + Sync,
    for<'a> &'a W: Write,
{
    fn write(&self, buf: &[u8]) -> WriteResult {
        write_once(&self.writer, buf)
    }

    fn sync(&self) -> SinkResult<()> {
        Ok(())
    }
}

// 适配器本身仍然是普通写入目标，因此二次适配与一次适配的行为完全一致
impl<'a, W> Write for &'a AddSync<W>
where
    &'a W: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let this: &'a AddSync<W> = *self;
        let mut writer: &'a W = &this.writer;
        writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
