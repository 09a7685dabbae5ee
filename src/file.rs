//! Shared file handle coordinating readers, a writer and an appender
//!
//! 协调读取者、写入者和追加者的共享文件句柄
//!
//! Provides one coordinator and three kinds of handles:
//! - [`SharedFile`]: owns the descriptor, the locks, the pending counter and the cached size
//! - [`FileReader`]: bounded window, shared lock, runs alongside other readers and an appender
//! - [`FileWriter`]: exclusive lock, writes and seeks anywhere
//! - [`FileAppender`]: shared lock plus append lock, writes at the end only
//!
//! 提供一个协调者和三种句柄：
//! - [`SharedFile`]: 持有描述符、锁、待处理计数与缓存大小
//! - [`FileReader`]: 有界窗口，共享锁，可与其他读取者及一个追加者并行
//! - [`FileWriter`]: 排他锁，可在任意位置写入与定位
//! - [`FileAppender`]: 共享锁加追加锁，仅在末尾写入
//!
//! # Lifecycle
//!
//! Every handle is issued by the [`SharedFile`] and released exactly once,
//! either by its `close` method or on drop. A released handle rejects every
//! further operation with [`Error::AlreadyClosed`]. [`SharedFile::close`]
//! waits until all handles are released.
//!
//! # 生命周期
//!
//! 每个句柄都由 [`SharedFile`] 发放，并且只释放一次：通过 `close` 方法或 drop。
//! 已释放的句柄对后续所有操作返回 [`Error::AlreadyClosed`]。[`SharedFile::close`]
//! 会等待所有句柄释放。
//!
//! ```
//! # use concurrent_file::{Error, SharedFile, Result};
//! # use tempfile::tempdir;
//! # use std::io::Write;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! let file = SharedFile::open(dir.path().join("lifecycle.bin"))?;
//!
//! let mut writer = file.writer()?;
//! writer.write_all(b"abc")?;
//! writer.close()?;
//!
//! // Released handles fail instead of silently doing nothing
//! // 已释放的句柄返回错误，而不是静默无操作
//! let err = writer.write(b"x").unwrap_err();
//! assert!(Error::from(err).is_closed());
//! assert!(writer.close().unwrap_err().is_closed());
//! # Ok(())
//! # }
//! ```

mod appender;
mod error;
mod options;
mod os;
mod pending;
mod reader;
mod shared_file;
mod writer;


// Re-export public API
// 重新导出公共 API
pub use appender::FileAppender;
pub use error::{Error, Result};
pub use options::SharedFileOptions;
pub use reader::FileReader;
pub use shared_file::SharedFile;
pub use writer::FileWriter;
