//! Positional I/O that leaves the shared file cursor alone (unix)
//!
//! 不移动共享文件游标的定位读写（unix）
//!
//! On windows `seek_read` / `seek_write` do move the cursor; callers that
//! depend on it re-seek afterwards.
//!
//! windows 上 `seek_read` / `seek_write` 会移动游标，依赖游标的调用方需自行重新定位。

use std::fs::File;
use std::io;

#[cfg(unix)]
#[inline]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::read_at(file, buf, offset)
}

#[cfg(unix)]
#[inline]
pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::unix::fs::FileExt::write_at(file, buf, offset)
}

#[cfg(windows)]
#[inline]
pub(crate) fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_read(file, buf, offset)
}

#[cfg(windows)]
#[inline]
pub(crate) fn write_at(file: &File, buf: &[u8], offset: u64) -> io::Result<usize> {
    std::os::windows::fs::FileExt::seek_write(file, buf, offset)
}

#[cfg(not(any(unix, windows)))]
compile_error!("unsupported platform");
