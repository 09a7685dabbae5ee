//! Error types for concurrent-file
//!
//! concurrent-file 的错误类型

use std::io;
use thiserror::Error;

/// Error type for shared file operations
///
/// 共享文件操作的错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// The handle or the shared file has already been released / closed
    ///
    /// 句柄或共享文件已被释放 / 关闭
    #[error("file already closed / 文件已关闭")]
    AlreadyClosed,

    /// The adopted resource is not a regular file (directory, device, pipe...)
    ///
    /// 接管的资源不是普通文件（目录、设备、管道等）
    #[error("not a regular file / 不是普通文件")]
    InvalidResource,

    /// I/O error from the filesystem, passed through unchanged
    ///
    /// 文件系统 I/O 错误，原样透传
    #[error(transparent)]
    Io(io::Error),
}

impl Error {
    /// Whether this is [`Error::AlreadyClosed`]
    ///
    /// 是否为 [`Error::AlreadyClosed`]
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::AlreadyClosed)
    }
}

/// Convert from io::Error to Error
///
/// An `io::Error` produced by this crate's `std::io` trait impls carries the
/// original [`Error`] as its payload; it is unwrapped back here so that
/// `AlreadyClosed` survives a round trip through `io::Read` / `io::Write`.
///
/// 从 io::Error 转换到 Error。本 crate 的 `std::io` trait 实现会把原始 [`Error`]
/// 作为负载，这里将其还原。
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }

        let kind = err.kind();
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(inner)) => *inner,
            Some(Err(inner)) => Error::Io(io::Error::new(kind, inner)),
            None => Error::Io(kind.into()),
        }
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::AlreadyClosed => io::Error::other(err),
            Error::InvalidResource => io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;
