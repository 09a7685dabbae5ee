//! Bounded reader over a fixed window of the shared file
//!
//! 共享文件固定窗口上的有界读取器

use super::error::{Error, Result};
use super::os;
use super::shared_file::{SharedFile, SharedSlot};
use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Reader over `[offset, offset + len)`, holding the shared access lock
///
/// 读取 `[offset, offset + len)` 的读取器，持有共享访问锁
///
/// Issued by [`SharedFile::section_reader`] and friends. The window is fixed
/// when the reader is issued; reads use positional I/O, so many readers and an
/// appender can run at the same time without disturbing each other.
///
/// 由 [`SharedFile::section_reader`] 等方法发放。窗口在发放时固定；读取使用定位 I/O，
/// 因此多个读取者与一个追加者可以同时运行而互不干扰。
///
/// The lock is released by [`close`](Self::close) or on drop. Any operation
/// after `close` fails with [`Error::AlreadyClosed`].
///
/// 锁由 [`close`](Self::close) 或 drop 释放。`close` 之后的任何操作都返回 [`Error::AlreadyClosed`]。
pub struct FileReader<'a> {
    file: &'a SharedFile,
    slot: Option<SharedSlot<'a>>,
    offset: u64,
    len: u64,
    /// Sequential cursor, relative to `offset`
    ///
    /// 顺序游标，相对于 `offset`
    pos: u64,
}

impl<'a> FileReader<'a> {
    pub(crate) fn new(file: &'a SharedFile, slot: SharedSlot<'a>, offset: u64, len: u64) -> Self {
        Self {
            file,
            slot: Some(slot),
            offset,
            len,
            pos: 0,
        }
    }

    /// Absolute file offset where the window starts
    ///
    /// 窗口起始的绝对文件偏移
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Window length in bytes
    ///
    /// 窗口长度（字节）
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current cursor relative to the window start
    ///
    /// 相对窗口起始的当前游标
    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read at `offset` relative to the window start, without moving the cursor
    ///
    /// 在相对窗口起始的 `offset` 处读取，不移动游标
    ///
    /// Returns `Ok(0)` at or past the end of the window.
    ///
    /// 在窗口末尾或之后返回 `Ok(0)`。
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let file = self.handle()?;
        if offset >= self.len {
            return Ok(0);
        }

        let max = clamp_len(buf.len(), self.len - offset);
        Ok(os::read_at(file, &mut buf[..max], self.offset + offset)?)
    }

    /// Release the shared lock
    ///
    /// 释放共享锁
    ///
    /// # Errors
    /// [`Error::AlreadyClosed`] if already released.
    ///
    /// # Errors
    /// 已释放时返回 [`Error::AlreadyClosed`]。
    pub fn close(&mut self) -> Result<()> {
        let slot = self.slot.take().ok_or(Error::AlreadyClosed)?;
        debug!("reader released: offset={} len={}", self.offset, self.len);
        self.file.release(slot);
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

impl Read for FileReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let file = self.handle()?;
        if self.pos >= self.len {
            return Ok(0);
        }

        let max = clamp_len(buf.len(), self.len - self.pos);
        let n = os::read_at(file, &mut buf[..max], self.offset + self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// Seeks are relative to the window and clamped to `[0, len]`
///
/// 定位相对于窗口，并限制在 `[0, len]` 之内
impl Seek for FileReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.handle()?;

        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of reader window",
            ));
        }

        self.pos = target.min(i128::from(self.len)) as u64;
        Ok(self.pos)
    }
}

impl Drop for FileReader<'_> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            let _ = self.close();
        }
    }
}

impl std::fmt::Debug for FileReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("pos", &self.pos)
            .field("closed", &self.slot.is_none())
            .finish()
    }
}

#[inline]
fn clamp_len(buf_len: usize, remaining: u64) -> usize {
    usize::try_from(remaining).map_or(buf_len, |remaining| buf_len.min(remaining))
}
