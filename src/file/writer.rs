//! Exclusive writer
//!
//! 排他写入器

use super::error::{Error, Result};
use super::os;
use super::shared_file::{ExclusiveSlot, SharedFile};
use log::{debug, warn};
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};

/// Writer holding the access lock exclusively
///
/// 以排他方式持有访问锁的写入器
///
/// While a `FileWriter` is open no reader, appender or other writer can be
/// issued. Writes go through the shared file cursor, which starts where
/// [`SharedFile::writer_at`] / [`SharedFile::writer`] put it.
///
/// `FileWriter` 打开期间无法发放任何读取者、追加者或其他写入者。
/// 写入经由共享文件游标，起始位置由 [`SharedFile::writer_at`] / [`SharedFile::writer`] 决定。
///
/// Because a write may extend, overwrite or (after a seek) leave the size
/// untouched, [`close`](Self::close) re-reads the true size from metadata
/// instead of counting bytes.
///
/// 由于写入可能扩展、覆盖或（定位后）不改变大小，[`close`](Self::close)
/// 会从元数据重新读取真实大小，而不是累计字节数。
///
/// # Examples
///
/// ```
/// # use concurrent_file::{SharedFile, Result};
/// # use tempfile::tempdir;
/// # use std::io::{Seek, SeekFrom, Write};
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// let file = SharedFile::open(dir.path().join("w.bin"))?;
///
/// let mut writer = file.writer_at(0)?;
/// writer.write_all(b"hello world")?;
/// writer.seek(SeekFrom::Start(6))?;
/// writer.write_all(b"there")?;
/// writer.close()?;
///
/// assert_eq!(file.size(), 11);
/// let mut buf = [0u8; 11];
/// file.read(&mut buf)?;
/// assert_eq!(&buf, b"hello there");
/// # Ok(())
/// # }
/// ```
pub struct FileWriter<'a> {
    file: &'a SharedFile,
    slot: Option<ExclusiveSlot<'a>>,
    pos: u64,
}

impl<'a> FileWriter<'a> {
    pub(crate) fn new(file: &'a SharedFile, slot: ExclusiveSlot<'a>, pos: u64) -> Self {
        Self {
            file,
            slot: Some(slot),
            pos,
        }
    }

    /// Absolute position of the cursor
    ///
    /// 游标的绝对位置
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Write at absolute `offset` without moving the cursor
    ///
    /// 在绝对偏移 `offset` 处写入，不移动游标
    ///
    /// Runs under this writer's own exclusive hold; the lock is not taken a
    /// second time.
    ///
    /// 在本写入器已持有的排他锁下执行，不会再次获取锁。
    pub fn write_at(&mut self, buf: &[u8], offset: u64) -> Result<usize> {
        let pos = self.pos;
        let mut file = self.handle()?;
        let n = os::write_at(file, buf, offset)?;
        if cfg!(windows) {
            file.seek(SeekFrom::Start(pos))?;
        }
        Ok(n)
    }

    /// Publish the new size and release the exclusive lock
    ///
    /// 发布新大小并释放排他锁
    ///
    /// With [`sync_on_write_close`](super::SharedFileOptions::sync_on_write_close)
    /// the file is synced first. If the sync or the size query fails, the
    /// cached size is left as it was and the error is returned; the lock is
    /// released either way.
    ///
    /// 启用 [`sync_on_write_close`](super::SharedFileOptions::sync_on_write_close) 时先同步文件。
    /// 若同步或查询大小失败，缓存大小保持不变并返回错误；无论如何都会释放锁。
    pub fn close(&mut self) -> Result<()> {
        let slot = self.slot.take().ok_or(Error::AlreadyClosed)?;
        let published = self.publish(&slot);
        debug!("writer released: pos={} size={}", self.pos, self.file.size());
        self.file.release(slot);
        published
    }

    fn publish(&self, slot: &Option<File>) -> Result<()> {
        let file = slot.as_ref().ok_or(Error::AlreadyClosed)?;
        if self.file.options().sync_on_write_close {
            file.sync_all()?;
        }
        self.file.set_size(file.metadata()?.len());
        Ok(())
    }

    #[inline]
    fn handle(&self) -> Result<&File> {
        self.slot
            .as_ref()
            .and_then(|slot| (**slot).as_ref())
            .ok_or(Error::AlreadyClosed)
    }
}

impl Write for FileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.handle()?;
        let n = file.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.handle()?;
        file.flush()
    }
}

impl Seek for FileWriter<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut file = self.handle()?;
        self.pos = file.seek(pos)?;
        Ok(self.pos)
    }
}

impl Drop for FileWriter<'_> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            if let Err(err) = self.close() {
                warn!("writer release on drop failed: {}", err);
            }
        }
    }
}

impl std::fmt::Debug for FileWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("pos", &self.pos)
            .field("closed", &self.slot.is_none())
            .finish()
    }
}
