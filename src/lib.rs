//! Concurrent access to a single file through one shared descriptor
//!
//! 通过单个共享描述符并发访问同一文件
//!
//! Many readers stream from arbitrary byte ranges while at most one writer or
//! appender mutates the file. The current size is cached and can be queried
//! without I/O, and closing waits for every outstanding handle instead of
//! cutting work short. No memory mapping and no OS advisory locks are involved;
//! coordination is purely in-process.
//!
//! 多个读取者可从任意字节范围流式读取，同时最多只有一个写入者或追加者修改文件。
//! 当前大小被缓存，查询无需 I/O；关闭时会等待所有未释放的句柄，而不会截断进行中的工作。
//! 不使用内存映射，也不使用操作系统咨询锁；协调完全在进程内完成。
//!
//! # Features
//!
//! - **Bounded readers**: each [`FileReader`] sees a window fixed when it is issued
//! - **Appends alongside reads**: a [`FileAppender`] only excludes writers and other appenders
//! - **Exclusive writes**: a [`FileWriter`] excludes every other handle
//! - **Cached size**: [`SharedFile::size`] is a single atomic load
//! - **Draining close**: [`SharedFile::close`] waits for all handles
//!
//! # 特性
//!
//! - **有界读取**：每个 [`FileReader`] 看到的窗口在发放时固定
//! - **读写并行追加**：[`FileAppender`] 只排斥写入者和其他追加者
//! - **排他写入**：[`FileWriter`] 排斥所有其他句柄
//! - **缓存大小**：[`SharedFile::size`] 只是一次原子读取
//! - **排空式关闭**：[`SharedFile::close`] 等待所有句柄
//!
//! # Quick Start
//!
//! ```
//! use concurrent_file::{SharedFile, Result};
//! use std::io::Read;
//! # use tempfile::tempdir;
//! # fn main() -> Result<()> {
//! # let dir = tempdir()?;
//! # let path = dir.path().join("log.bin");
//!
//! let file = SharedFile::open(&path)?;
//! file.append(b"0123456789")?;
//!
//! // The reader's window is fixed at 10 bytes
//! // 读取器窗口固定为 10 字节
//! let mut reader = file.reader()?;
//!
//! // Appending does not wait for the reader
//! // 追加无需等待读取器
//! file.append(b"9876543210")?;
//!
//! let mut first = Vec::new();
//! reader.read_to_end(&mut first)?;
//! reader.close()?;
//! assert_eq!(first, b"0123456789");
//!
//! let mut all = Vec::new();
//! file.write_to(&mut all)?;
//! assert_eq!(all, b"01234567899876543210");
//! assert_eq!(file.size(), 20);
//!
//! file.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`SharedFile`]: Coordinator owning the descriptor
//! - [`FileReader`]: Bounded reader
//! - [`FileWriter`]: Exclusive writer
//! - [`FileAppender`]: End-of-file appender
//! - [`SharedFileOptions`]: Configuration
//!
//! # 主要类型
//!
//! - [`SharedFile`]: 持有描述符的协调者
//! - [`FileReader`]: 有界读取器
//! - [`FileWriter`]: 排他写入器
//! - [`FileAppender`]: 文件末尾追加器
//! - [`SharedFileOptions`]: 配置

mod file;

pub use file::{
    Error, FileAppender, FileReader, FileWriter, Result, SharedFile, SharedFileOptions,
};
