//! Appender writing at the end of the shared file
//!
//! 在共享文件末尾写入的追加器

use super::error::{Error, Result};
use super::os;
use super::shared_file::{SharedFile, SharedSlot};
use log::{debug, warn};
use parking_lot::MutexGuard;
use std::fs::File;
use std::io::{self, Write};

struct AppendLease<'a> {
    serial: MutexGuard<'a, ()>,
    access: SharedSlot<'a>,
}

/// Appender holding the shared access lock and the append lock
///
/// 持有共享访问锁与追加锁的追加器
///
/// Only one appender is open at a time and never alongside a writer, but
/// readers keep running. Each write lands right after the previous one,
/// starting from the end of the file as it was when the appender was issued.
///
/// 同一时刻只有一个追加器，且不会与写入者同时存在，但读取者可以继续运行。
/// 每次写入紧接上一次写入，从发放追加器时的文件末尾开始。
///
/// On [`close`](Self::close) the number of bytes written is added to the
/// cached size; appends only ever extend the file, so no metadata query is
/// needed.
///
/// [`close`](Self::close) 时将写入的字节数累加到缓存大小；追加只会扩展文件，因此无需查询元数据。
pub struct FileAppender<'a> {
    file: &'a SharedFile,
    lease: Option<AppendLease<'a>>,
    base: u64,
    written: u64,
}

impl<'a> FileAppender<'a> {
    pub(crate) fn new(
        file: &'a SharedFile,
        serial: MutexGuard<'a, ()>,
        access: SharedSlot<'a>,
        base: u64,
    ) -> Self {
        Self {
            file,
            lease: Some(AppendLease { serial, access }),
            base,
            written: 0,
        }
    }

    /// Bytes written through this appender so far
    ///
    /// 目前通过该追加器写入的字节数
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }

    /// End of file when the appender was issued
    ///
    /// 发放追加器时的文件末尾
    #[inline]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Publish the appended length and release both locks
    ///
    /// 发布追加长度并释放两把锁
    ///
    /// With [`sync_on_write_close`](super::SharedFileOptions::sync_on_write_close)
    /// the file is synced first and a failed sync leaves the cached size
    /// untouched. Releases the pending slot, the append lock and the shared
    /// lock, in that order, whatever the outcome.
    ///
    /// 启用 [`sync_on_write_close`](super::SharedFileOptions::sync_on_write_close) 时先同步文件，
    /// 同步失败时缓存大小保持不变。无论结果如何，依次释放待处理计数、追加锁和共享锁。
    pub fn close(&mut self) -> Result<()> {
        let lease = self.lease.take().ok_or(Error::AlreadyClosed)?;
        let published = self.publish(&lease.access);
        debug!(
            "appender released: base={} written={}",
            self.base, self.written
        );

        let AppendLease { serial, access } = lease;
        self.file.release(serial);
        drop(access);
        self.file.reap();
        published
    }

    fn publish(&self, slot: &Option<File>) -> Result<()> {
        if self.written == 0 {
            return Ok(());
        }

        let file = slot.as_ref().ok_or(Error::AlreadyClosed)?;
        if self.file.options().sync_on_write_close {
            file.sync_all()?;
        }
        self.file.add_size(self.written);
        Ok(())
    }

    #[inline]
    fn handle(&self) -> Result<&File> {
        self.lease
            .as_ref()
            .and_then(|lease| (*lease.access).as_ref())
            .ok_or(Error::AlreadyClosed)
    }
}

impl Write for FileAppender<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self.handle()?;
        let n = os::write_at(file, buf, self.base + self.written)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.handle()?;
        file.flush()
    }
}

impl Drop for FileAppender<'_> {
    fn drop(&mut self) {
        if self.lease.is_some() {
            if let Err(err) = self.close() {
                warn!("appender release on drop failed: {}", err);
            }
        }
    }
}

impl std::fmt::Debug for FileAppender<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAppender")
            .field("base", &self.base)
            .field("written", &self.written)
            .field("closed", &self.lease.is_none())
            .finish()
    }
}
