//! 块设备接口

use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 实现此 trait 以提供底层块设备访问。缓存只按字节偏移读写整块数据，
/// 不关心分区、扇区等几何信息。
///
/// 读写都是阻塞的，成功时应完整传输 `buf.len()` 字节。返回的字节数少于
/// 请求长度会被缓存视为致命的短读/短写。
///
/// # 示例
///
/// ```rust,ignore
/// use blockdev_core::{BlockDevice, Result};
///
/// struct RamDisk {
///     data: Vec<u8>,
/// }
///
/// impl BlockDevice for RamDisk {
///     fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
///         let start = offset as usize;
///         buf.copy_from_slice(&self.data[start..start + buf.len()]);
///         Ok(buf.len())
///     }
///
///     fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
///         let start = offset as usize;
///         self.data[start..start + buf.len()].copy_from_slice(buf);
///         Ok(buf.len())
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 从字节偏移 `offset` 读取 `buf.len()` 字节
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// 向字节偏移 `offset` 写入 `buf.len()` 字节
    ///
    /// # 返回
    ///
    /// 成功返回实际写入的字节数
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize>;

    /// 刷新设备缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<D: BlockDevice + ?Sized> BlockDevice for &mut D {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_at(offset, buf)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        (**self).write_at(offset, buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// 完整读取一块，短读视为致命错误
pub(crate) fn read_exact_at<D: BlockDevice + ?Sized>(
    device: &mut D,
    offset: u64,
    buf: &mut [u8],
) -> Result<()> {
    let n = device.read_at(offset, buf).map_err(|e| {
        log::error!("[DEV] read at {:#x} failed: {}", offset, e);
        Error::new(ErrorKind::Io, "device read failed")
    })?;

    if n != buf.len() {
        log::error!("[DEV] short read at {:#x}: rc={} != sz={}", offset, n, buf.len());
        return Err(Error::new(ErrorKind::ShortTransfer, "short read from device"));
    }
    Ok(())
}

/// 完整写入一块，短写视为致命错误
pub(crate) fn write_exact_at<D: BlockDevice + ?Sized>(
    device: &mut D,
    offset: u64,
    buf: &[u8],
) -> Result<()> {
    let n = device.write_at(offset, buf).map_err(|e| {
        log::error!("[DEV] write at {:#x} failed: {}", offset, e);
        Error::new(ErrorKind::Io, "device write failed")
    })?;

    if n != buf.len() {
        log::error!("[DEV] short write at {:#x}: rc={} != sz={}", offset, n, buf.len());
        return Err(Error::new(ErrorKind::ShortTransfer, "short write to device"));
    }
    Ok(())
}
