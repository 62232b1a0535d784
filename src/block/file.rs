//! 基于 std I/O 的块设备

use super::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// 文件块设备
///
/// 把任意 `Read + Write + Seek` 句柄（例如 `std::fs::File`）包装成 [`BlockDevice`]。
/// 每次读写先定位到字节偏移，再循环传输直到完成或遇到文件末尾。
///
/// ```rust,ignore
/// let file = OpenOptions::new().read(true).write(true).open("disk.img")?;
/// let mut cache = BlockCache::new(FileDevice::new(file), 64, 4096, 4)?;
/// ```
#[derive(Debug)]
pub struct FileDevice<F> {
    inner: F,
}

impl<F> FileDevice<F> {
    /// 包装 I/O 句柄
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    /// 获取底层句柄的引用
    pub fn get_ref(&self) -> &F {
        &self.inner
    }

    /// 取回底层句柄
    pub fn into_inner(self) -> F {
        self.inner
    }
}

fn io_error(op: &'static str, offset: u64, err: io::Error) -> Error {
    log::error!("[DEV] {} at {:#x}: {}", op, offset, err);
    Error::new(ErrorKind::Io, op)
}

impl<F: Read + Write + Seek> BlockDevice for FileDevice<F> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| io_error("seek failed", offset, e))?;

        let mut done = 0;
        while done < buf.len() {
            match self.inner.read(&mut buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error("read failed", offset, e)),
            }
        }
        Ok(done)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| io_error("seek failed", offset, e))?;

        let mut done = 0;
        while done < buf.len() {
            match self.inner.write(&buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error("write failed", offset, e)),
            }
        }
        Ok(done)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| io_error("flush failed", 0, e))
    }
}
