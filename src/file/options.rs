//! Configuration for [`SharedFile`](super::SharedFile)
//!
//! [`SharedFile`](super::SharedFile) 的配置

/// Options applied to a [`SharedFile`](super::SharedFile) for its whole lifetime
///
/// 作用于 [`SharedFile`](super::SharedFile) 整个生命周期的选项
///
/// # Examples
///
/// ```
/// use concurrent_file::SharedFileOptions;
///
/// let options = SharedFileOptions::default().sync_on_write_close(true);
/// assert!(options.syncs_on_write_close());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SharedFileOptions {
    /// Call `sync_all` when a writer or appender is closed, before the new
    /// size is published
    ///
    /// 关闭写入器或追加器时，在发布新大小之前调用 `sync_all`
    pub sync_on_write_close: bool,
}

impl SharedFileOptions {
    /// Set [`sync_on_write_close`](Self::sync_on_write_close)
    ///
    /// 设置 [`sync_on_write_close`](Self::sync_on_write_close)
    #[inline]
    pub fn sync_on_write_close(mut self, enabled: bool) -> Self {
        self.sync_on_write_close = enabled;
        self
    }

    /// Whether writers and appenders sync on close
    ///
    /// 写入器和追加器关闭时是否同步
    #[inline]
    pub fn syncs_on_write_close(&self) -> bool {
        self.sync_on_write_close
    }
}
