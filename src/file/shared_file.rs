//! Coordinator owning the shared file descriptor
//!
//! 持有共享文件描述符的协调者

use super::appender::FileAppender;
use super::error::{Error, Result};
use super::options::SharedFileOptions;
use super::pending::Pending;
use super::reader::FileReader;
use super::writer::FileWriter;
use log::debug;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fs::{File, Metadata, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub(crate) type SharedSlot<'a> = RwLockReadGuard<'a, Option<File>>;
pub(crate) type ExclusiveSlot<'a> = RwLockWriteGuard<'a, Option<File>>;

/// A single file descriptor shared by many readers and one writer or appender
///
/// 由多个读取者和一个写入者或追加者共享的单个文件描述符
///
/// Access is coordinated with a shared/exclusive lock plus a separate append lock:
///
/// | Handle           | Access lock | Append lock | Blocks behind                 |
/// |------------------|-------------|-------------|-------------------------------|
/// | [`FileReader`]   | shared      | -           | an open writer                |
/// | [`FileAppender`] | shared      | exclusive   | an open writer or appender    |
/// | [`FileWriter`]   | exclusive   | -           | every other open handle       |
///
/// 访问通过共享/排他锁加独立的追加锁进行协调：读取者持有共享锁；追加者持有共享锁与追加锁；
/// 写入者持有排他锁。
///
/// The current size is cached in an atomic and published when a writer or
/// appender is closed, so [`size`](Self::size) never touches the filesystem.
/// [`close`](Self::close) waits for every outstanding handle before releasing
/// the descriptor.
///
/// 当前大小缓存在原子变量中，并在写入者或追加者关闭时发布，因此 [`size`](Self::size)
/// 不会访问文件系统。[`close`](Self::close) 会等待所有未释放的句柄后再释放描述符。
///
/// Handles borrow the `SharedFile`; share it between threads with
/// `std::thread::scope` or an `Arc`. A handle is `Send` and may be released on
/// a different thread from the one that opened it.
///
/// 句柄借用 `SharedFile`；可通过 `std::thread::scope` 或 `Arc` 在线程间共享。
/// 句柄实现了 `Send`，可以在与打开它的线程不同的线程上释放。
///
/// # Examples
///
/// ```
/// # use concurrent_file::{SharedFile, Result};
/// # use tempfile::tempdir;
/// # use std::io::{Read, Write};
/// # fn main() -> Result<()> {
/// # let dir = tempdir()?;
/// # let path = dir.path().join("data.bin");
/// let file = SharedFile::open(&path)?;
///
/// let mut appender = file.appender()?;
/// appender.write_all(b"0123456789")?;
/// appender.close()?;
/// assert_eq!(file.size(), 10);
///
/// std::thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             let mut reader = file.reader().unwrap();
///             let mut buf = Vec::new();
///             reader.read_to_end(&mut buf).unwrap();
///             assert_eq!(buf, b"0123456789");
///         });
///     }
/// });
///
/// file.close()?;
/// # Ok(())
/// # }
/// ```
pub struct SharedFile {
    /// The descriptor lives inside the access lock; `None` once closed
    ///
    /// 描述符位于访问锁内部；关闭后为 `None`
    access: RwLock<Option<File>>,

    /// Serializes appenders against each other
    ///
    /// 串行化追加者
    append: Mutex<()>,

    pending: Pending,

    /// Size as of the last completed write, append or truncate
    ///
    /// 最近一次完成的写入、追加或截断后的大小
    size: AtomicU64,

    /// Set by `close` / `force_close`; rejects new handles
    ///
    /// 由 `close` / `force_close` 设置；拒绝新句柄
    closed: AtomicBool,

    path: Option<PathBuf>,
    options: SharedFileOptions,
}

impl SharedFile {
    /// Open (or create) `path` for reading and writing with default options
    ///
    /// 以默认选项读写方式打开（或创建）`path`
    ///
    /// # Errors
    /// Filesystem errors are returned unchanged as [`Error::Io`].
    ///
    /// # Errors
    /// 文件系统错误以 [`Error::Io`] 原样返回。
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, SharedFileOptions::default())
    }

    /// Open (or create) `path` for reading and writing
    ///
    /// 以读写方式打开（或创建）`path`
    pub fn open_with(path: impl AsRef<Path>, options: SharedFileOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Self::adopt(file, Some(path.to_path_buf()), options)
    }

    /// Open (or create) `path`, applying unix permission bits `mode` on creation
    ///
    /// 打开（或创建）`path`，创建时使用 unix 权限位 `mode`
    #[cfg(unix)]
    pub fn open_with_mode(
        path: impl AsRef<Path>,
        mode: u32,
        options: SharedFileOptions,
    ) -> Result<Self> {
        use std::os::unix::fs::OpenOptionsExt;

        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(mode)
            .open(path)?;

        Self::adopt(file, Some(path.to_path_buf()), options)
    }

    /// Create a uniquely named file in the system temp directory
    ///
    /// 在系统临时目录中创建唯一命名的文件
    ///
    /// The file is not removed automatically; delete [`name`](Self::name)
    /// when done.
    ///
    /// 文件不会被自动删除；使用完毕后请删除 [`name`](Self::name)。
    pub fn temp(prefix: &str) -> Result<Self> {
        Self::temp_in(std::env::temp_dir(), prefix)
    }

    /// Create a uniquely named file in `dir`
    ///
    /// 在 `dir` 中创建唯一命名的文件
    ///
    /// ```
    /// # use concurrent_file::{SharedFile, Result};
    /// # use tempfile::tempdir;
    /// # fn main() -> Result<()> {
    /// # let dir = tempdir()?;
    /// let file = SharedFile::temp_in(dir.path(), "segment-")?;
    /// let path = file.name().unwrap().to_path_buf();
    /// assert!(path.file_name().unwrap().to_string_lossy().starts_with("segment-"));
    ///
    /// file.close()?;
    /// std::fs::remove_file(path)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn temp_in(dir: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let named = tempfile::Builder::new().prefix(prefix).tempfile_in(dir)?;
        let (file, path) = named.keep().map_err(|err| Error::Io(err.error))?;

        match Self::adopt(file, Some(path.clone()), SharedFileOptions::default()) {
            Ok(shared) => Ok(shared),
            Err(err) => {
                let _ = std::fs::remove_file(&path);
                Err(err)
            }
        }
    }

    /// Wrap an already open file with default options
    ///
    /// 以默认选项包装一个已打开的文件
    ///
    /// Writers need a file opened without `append(true)`, otherwise every
    /// write lands at the end regardless of the writer's position.
    ///
    /// 写入者要求文件未以 `append(true)` 打开，否则所有写入都会落在文件末尾。
    ///
    /// # Errors
    /// - [`Error::InvalidResource`] if `file` is not a regular file
    /// - [`Error::Io`] if its metadata cannot be read
    ///
    /// # Errors
    /// - 如果 `file` 不是普通文件，返回 [`Error::InvalidResource`]
    /// - 如果无法读取元数据，返回 [`Error::Io`]
    pub fn from_file(file: File) -> Result<Self> {
        Self::from_file_with(file, SharedFileOptions::default())
    }

    /// Wrap an already open file
    ///
    /// 包装一个已打开的文件
    pub fn from_file_with(file: File, options: SharedFileOptions) -> Result<Self> {
        Self::adopt(file, None, options)
    }

    fn adopt(file: File, path: Option<PathBuf>, options: SharedFileOptions) -> Result<Self> {
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(Error::InvalidResource);
        }

        debug!("shared file opened: path={:?} size={}", path, meta.len());

        Ok(Self {
            access: RwLock::new(Some(file)),
            append: Mutex::new(()),
            pending: Pending::default(),
            size: AtomicU64::new(meta.len()),
            closed: AtomicBool::new(false),
            path,
            options,
        })
    }

    /// Reader over the whole file, equivalent to `section_reader(0, None)`
    ///
    /// 覆盖整个文件的读取器，等价于 `section_reader(0, None)`
    #[inline]
    pub fn reader(&self) -> Result<FileReader<'_>> {
        self.section_reader(0, None)
    }

    /// Reader from `offset` to the current end, equivalent to `section_reader(offset, None)`
    ///
    /// 从 `offset` 到当前末尾的读取器
    #[inline]
    pub fn reader_at(&self, offset: u64) -> Result<FileReader<'_>> {
        self.section_reader(offset, None)
    }

    /// Reader over `[offset, offset + len)`
    ///
    /// 读取 `[offset, offset + len)` 的读取器
    ///
    /// The window is fixed against the cached size when the reader is issued:
    /// `None`, or a `len` reaching past the end, is clamped to
    /// `size - offset` (zero when `offset` is past the end). Data appended
    /// afterwards is never visible through this reader.
    ///
    /// 窗口在发放时根据缓存大小固定：`None` 或超出末尾的 `len` 会被截断为
    /// `size - offset`（`offset` 超出末尾时为零）。之后追加的数据对该读取器不可见。
    ///
    /// Blocks only while a [`FileWriter`] is open.
    ///
    /// 仅在有 [`FileWriter`] 打开时阻塞。
    pub fn section_reader(&self, offset: u64, len: Option<u64>) -> Result<FileReader<'_>> {
        let slot = self.shared()?;

        let available = self.size().saturating_sub(offset);
        let len = match len {
            Some(len) if len <= available => len,
            _ => available,
        };

        self.pending.add();
        debug!("reader issued: offset={} len={}", offset, len);
        Ok(FileReader::new(self, slot, offset, len))
    }

    /// Writer positioned at the end of the file
    ///
    /// 定位在文件末尾的写入器
    #[inline]
    pub fn writer(&self) -> Result<FileWriter<'_>> {
        self.open_writer(SeekFrom::End(0))
    }

    /// Writer positioned at absolute `offset`
    ///
    /// 定位在绝对偏移 `offset` 的写入器
    ///
    /// Takes the access lock exclusively: blocks until every reader, writer
    /// and appender has been released, and keeps all of them out until the
    /// writer is closed.
    ///
    /// 以排他方式获取访问锁：阻塞直到所有读取者、写入者和追加者释放，
    /// 并在写入者关闭前阻止它们进入。
    #[inline]
    pub fn writer_at(&self, offset: u64) -> Result<FileWriter<'_>> {
        self.open_writer(SeekFrom::Start(offset))
    }

    fn open_writer(&self, from: SeekFrom) -> Result<FileWriter<'_>> {
        let slot = self.exclusive()?;
        self.pending.add();

        let seeked = live(&slot).and_then(|mut file| Ok(file.seek(from)?));
        let pos = match seeked {
            Ok(pos) => pos,
            Err(err) => {
                self.release(slot);
                return Err(err);
            }
        };

        debug!("writer issued: pos={}", pos);
        Ok(FileWriter::new(self, slot, pos))
    }

    /// Appender writing at the end of the file
    ///
    /// 在文件末尾写入的追加器
    ///
    /// Takes the access lock shared, then the append lock, always in that
    /// order. Blocks behind an open writer or another open appender; readers
    /// proceed concurrently and keep their fixed windows.
    ///
    /// 先获取共享访问锁，再获取追加锁，顺序固定。在已打开的写入者或其他追加者之后阻塞；
    /// 读取者可并发进行，并保持其固定窗口。
    pub fn appender(&self) -> Result<FileAppender<'_>> {
        let slot = self.shared()?;
        let serial = self.append.lock();
        self.pending.add();

        let seeked = live(&slot).and_then(|mut file| Ok(file.seek(SeekFrom::End(0))?));
        let base = match seeked {
            Ok(base) => base,
            Err(err) => {
                self.pending.done();
                drop(serial);
                drop(slot);
                self.reap();
                return Err(err);
            }
        };

        debug!("appender issued: base={}", base);
        Ok(FileAppender::new(self, serial, slot, base))
    }

    /// Cached size in bytes; one atomic load, no I/O, no locking
    ///
    /// 缓存的大小（字节）；一次原子读取，无 I/O，无锁
    #[inline]
    pub fn size(&self) -> u64 {
        self.size.load(Ordering::Acquire)
    }

    /// Number of handles issued and not yet released
    ///
    /// 已发放但尚未释放的句柄数量
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.get()
    }

    /// Path of the file, if it was opened by path
    ///
    /// 文件路径（如果是按路径打开的）
    #[inline]
    pub fn name(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Options this file was opened with
    ///
    /// 打开该文件时使用的选项
    #[inline]
    pub fn options(&self) -> SharedFileOptions {
        self.options
    }

    /// Query filesystem metadata under the exclusive lock
    ///
    /// 在排他锁下查询文件系统元数据
    ///
    /// Waits for any open reader, writer or appender.
    ///
    /// 会等待所有已打开的读取者、写入者或追加者。
    pub fn metadata(&self) -> Result<Metadata> {
        let slot = self.exclusive()?;
        Ok(live(&slot)?.metadata()?)
    }

    /// Truncate or extend the file to `size` bytes
    ///
    /// 将文件截断或扩展到 `size` 字节
    ///
    /// On success the cached size becomes exactly `size`.
    ///
    /// 成功后缓存大小精确为 `size`。
    pub fn truncate(&self, size: u64) -> Result<()> {
        let slot = self.exclusive()?;
        live(&slot)?.set_len(size)?;
        self.set_size(size);
        debug!("truncated to {}", size);
        Ok(())
    }

    /// Run `f` with the raw file under the exclusive lock
    ///
    /// 在排他锁下以原始文件调用 `f`
    ///
    /// The cached size is re-read from metadata after `f` returns, whether it
    /// succeeded or not, since `f` may have changed it. An error from `f` is
    /// returned unchanged. Do not let the `&mut File` escape the closure.
    ///
    /// `f` 返回后（无论成功与否）都会从元数据重新读取缓存大小，因为 `f` 可能改变了它。
    /// `f` 的错误原样返回。
    ///
    /// ```
    /// # use concurrent_file::{SharedFile, Result};
    /// # use tempfile::tempdir;
    /// # use std::io::Write;
    /// # fn main() -> Result<()> {
    /// # let dir = tempdir()?;
    /// let file = SharedFile::open(dir.path().join("raw.bin"))?;
    /// file.with_file(|raw| raw.write_all(b"raw"))?;
    /// assert_eq!(file.size(), 3);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_file<T>(&self, f: impl FnOnce(&mut File) -> io::Result<T>) -> Result<T> {
        let mut slot = self.exclusive()?;
        let file = (*slot).as_mut().ok_or(Error::AlreadyClosed)?;
        let out = f(&mut *file);
        let len = file.metadata().map(|meta| meta.len());
        if let Ok(len) = len {
            self.set_size(len);
        }
        let out = out?;
        len?;
        Ok(out)
    }

    /// Wait for every outstanding handle, then close the file
    ///
    /// 等待所有未释放的句柄，然后关闭文件
    ///
    /// Blocks without timeout until the pending count reaches zero, then takes
    /// the exclusive lock so handles issued in the meantime are drained as
    /// well. With [`sync_on_write_close`](SharedFileOptions::sync_on_write_close)
    /// the file is synced first; the lock is released whether or not that
    /// succeeds.
    ///
    /// 无超时地阻塞直到待处理计数归零，然后获取排他锁，以便同时等待期间新发放的句柄。
    /// 启用 [`sync_on_write_close`](SharedFileOptions::sync_on_write_close) 时先同步文件；
    /// 无论成功与否都会释放锁。
    ///
    /// # Errors
    /// - [`Error::AlreadyClosed`] on a second call or after [`force_close`](Self::force_close)
    /// - [`Error::Io`] if the final sync fails
    ///
    /// # Errors
    /// - 第二次调用或在 [`force_close`](Self::force_close) 之后返回 [`Error::AlreadyClosed`]
    /// - 最终同步失败时返回 [`Error::Io`]
    pub fn close(&self) -> Result<()> {
        self.pending.wait();

        let mut slot = self.access.write();
        if self.closed.swap(true, Ordering::AcqRel) {
            slot.take();
            return Err(Error::AlreadyClosed);
        }
        let file = slot.take().ok_or(Error::AlreadyClosed)?;
        drop(slot);

        if self.options.sync_on_write_close {
            file.sync_all()?;
        }

        debug!("shared file closed: path={:?}", self.path);
        Ok(())
    }

    /// Close without waiting for outstanding handles
    ///
    /// 不等待未释放的句柄直接关闭
    ///
    /// Every later attempt to issue a handle fails with
    /// [`Error::AlreadyClosed`]. Handles already open keep working; the
    /// descriptor is dropped right away if none is open, otherwise by the last
    /// one to be released. Intended for abnormal shutdown.
    ///
    /// 之后所有发放句柄的尝试都会返回 [`Error::AlreadyClosed`]。已打开的句柄仍可使用；
    /// 若没有打开的句柄则立即释放描述符，否则由最后一个释放的句柄释放。用于异常关闭。
    pub fn force_close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyClosed);
        }

        debug!("shared file force closed: pending={}", self.pending());
        self.reap();
        Ok(())
    }

    /// Read once from offset 0 through a transient reader
    ///
    /// 通过临时读取器从偏移 0 读取一次
    #[inline]
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_at(buf, 0)
    }

    /// Read once from `offset` through a transient reader
    ///
    /// 通过临时读取器从 `offset` 读取一次
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut reader = self.reader_at(offset)?;
        let read = reader.read(buf);
        finish(read, reader.close())
    }

    /// Copy the whole file into `sink`
    ///
    /// 将整个文件复制到 `sink`
    pub fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
        let mut reader = self.reader()?;
        let copied = io::copy(&mut reader, sink);
        finish(copied, reader.close())
    }

    /// Copy `source` onto the end of the file through a transient appender
    ///
    /// 通过临时追加器将 `source` 复制到文件末尾
    pub fn read_from<R: Read + ?Sized>(&self, source: &mut R) -> Result<u64> {
        let mut appender = self.appender()?;
        let copied = io::copy(source, &mut appender);
        finish(copied, appender.close())
    }

    /// Write once at absolute `offset` through a transient writer
    ///
    /// 通过临时写入器在绝对偏移 `offset` 写入一次
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        let mut writer = self.writer_at(offset)?;
        let written = writer.write(buf);
        finish(written, writer.close())
    }

    /// Write once at the end of the file through a transient appender
    ///
    /// 通过临时追加器在文件末尾写入一次
    ///
    /// For several writes in a row take an [`appender`](Self::appender) instead.
    ///
    /// 连续多次写入时请直接使用 [`appender`](Self::appender)。
    pub fn append(&self, buf: &[u8]) -> Result<usize> {
        let mut appender = self.appender()?;
        let written = appender.write(buf);
        finish(written, appender.close())
    }

    #[inline]
    pub(crate) fn set_size(&self, size: u64) {
        self.size.store(size, Ordering::Release);
    }

    #[inline]
    pub(crate) fn add_size(&self, delta: u64) -> u64 {
        self.size.fetch_add(delta, Ordering::AcqRel) + delta
    }

    /// Release a handle's pending slot, then its lock
    ///
    /// 先释放句柄的待处理计数，再释放锁
    pub(crate) fn release<G>(&self, guard: G) {
        self.pending.done();
        drop(guard);
        self.reap();
    }

    /// Drop the descriptor after `force_close` once nothing holds the lock
    ///
    /// `force_close` 之后，在无人持有锁时释放描述符
    pub(crate) fn reap(&self) {
        if !self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Some(mut slot) = self.access.try_write() {
            if slot.take().is_some() {
                debug!("descriptor released after force close");
            }
        }
    }

    fn shared(&self) -> Result<SharedSlot<'_>> {
        let slot = self.access.read();
        if self.closed.load(Ordering::Acquire) || slot.is_none() {
            drop(slot);
            self.reap();
            return Err(Error::AlreadyClosed);
        }
        Ok(slot)
    }

    fn exclusive(&self) -> Result<ExclusiveSlot<'_>> {
        let mut slot = self.access.write();
        if self.closed.load(Ordering::Acquire) || slot.is_none() {
            slot.take();
            return Err(Error::AlreadyClosed);
        }
        Ok(slot)
    }
}

impl std::fmt::Debug for SharedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedFile")
            .field("path", &self.path)
            .field("size", &self.size())
            .field("pending", &self.pending())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .field("options", &self.options)
            .finish()
    }
}

/// The file behind a held slot
///
/// 已持有槽位中的文件
#[inline]
pub(crate) fn live(slot: &Option<File>) -> Result<&File> {
    slot.as_ref().ok_or(Error::AlreadyClosed)
}

/// Combine the result of the I/O done under a transient handle with the result
/// of closing it; the I/O error wins
///
/// 合并临时句柄上的 I/O 结果与关闭结果；优先返回 I/O 错误
#[inline]
fn finish<T>(io: io::Result<T>, closed: Result<()>) -> Result<T> {
    let value = io?;
    closed?;
    Ok(value)
}
