//! 测试用内存块设备

use super::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// 内存块设备，记录所有读写操作
pub(crate) struct MockDevice {
    pub block_size: usize,
    pub storage: Vec<u8>,
    pub reads: usize,
    pub writes: usize,
    /// 每次读取的字节偏移
    pub read_log: Vec<u64>,
    /// 每次写入的 (字节偏移, 长度)
    pub write_log: Vec<(u64, usize)>,
    pub short_reads: bool,
    pub short_writes: bool,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MockDevice {
    pub fn new(total_blocks: usize, block_size: usize) -> Self {
        Self {
            block_size,
            storage: alloc::vec![0u8; total_blocks * block_size],
            reads: 0,
            writes: 0,
            read_log: Vec::new(),
            write_log: Vec::new(),
            short_reads: false,
            short_writes: false,
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// 创建设备，并在每个块写入其块号模式
    pub fn stamped(total_blocks: usize, block_size: usize) -> Self {
        let mut dev = Self::new(total_blocks, block_size);
        for (block, chunk) in dev.storage.chunks_mut(block_size).enumerate() {
            stamp(chunk, block as u64);
        }
        dev
    }

    /// 块在设备上的内容
    pub fn block(&self, block: u64) -> &[u8] {
        let start = block as usize * self.block_size;
        &self.storage[start..start + self.block_size]
    }

    /// 清空统计
    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.writes = 0;
        self.read_log.clear();
        self.write_log.clear();
    }
}

/// 写入模式：开头 8 字节为小端块号，其余字节为块号低 8 位
pub(crate) fn stamp(buf: &mut [u8], block: u64) {
    buf.fill(block as u8);
    LittleEndian::write_u64(&mut buf[..8], block);
}

/// 读取 [`stamp`] 写入的块号
pub(crate) fn stamp_of(buf: &[u8]) -> u64 {
    LittleEndian::read_u64(&buf[..8])
}

impl BlockDevice for MockDevice {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads {
            return Err(Error::new(ErrorKind::Io, "mock read failure"));
        }
        self.reads += 1;
        self.read_log.push(offset);

        let start = offset as usize;
        let avail = self.storage.len().saturating_sub(start);
        let mut len = buf.len().min(avail);
        if self.short_reads {
            len /= 2;
        }
        if len == 0 {
            return Ok(0);
        }
        buf[..len].copy_from_slice(&self.storage[start..start + len]);
        Ok(len)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        if self.fail_writes {
            return Err(Error::new(ErrorKind::Io, "mock write failure"));
        }
        self.writes += 1;
        self.write_log.push((offset, buf.len()));

        let start = offset as usize;
        let avail = self.storage.len().saturating_sub(start);
        let mut len = buf.len().min(avail);
        if self.short_writes {
            len /= 2;
        }
        if len == 0 {
            return Ok(0);
        }
        self.storage[start..start + len].copy_from_slice(&buf[..len]);
        Ok(len)
    }
}
