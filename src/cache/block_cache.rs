//! 块缓存实现
//!
//! 定长缓存池 + 哈希索引 + LRU 链表。
//!
//! # 结构
//!
//! ```text
//! struct BlockCache {
//!     pool:  Vec<u8>,        // capacity * block_size，构造后不再分配
//!     descs: Vec<BufDesc>,   // 每个槽位一个描述符
//!     index: HashIndex,      // block % buckets -> 桶内链表
//!     lru:   IndexList,      // 未借出的描述符，头部是下一个驱逐对象
//! }
//! ```
//!
//! # 不变量（每个公开操作返回后成立）
//!
//! - 每个 VALID 描述符在哈希索引中恰好出现一次，且没有两个 VALID 描述符缓存同一块号
//! - 描述符在 LRU 链表上，当且仅当它没有被借出
//! - 借出的描述符不会被选为驱逐对象
//! - DIRTY 蕴含 VALID
//!
//! # 写穿
//!
//! `put` 时立即写回脏块，因此 LRU 链表上的块总是干净的，驱逐从不需要写盘。

use super::buffer::{BufDesc, BufFlags, BufHandle, BufferId, GetMode, LruLink};
use super::config::CacheConfig;
use super::index::HashIndex;
use crate::block::device::{read_exact_at, write_exact_at};
use crate::block::BlockDevice;
use crate::consts::{MAX_READAHEAD, MIN_BLOCK_SIZE};
use crate::error::{Error, ErrorKind, Result};
use crate::utils::IndexList;
use alloc::vec::Vec;
use core::ops::Range;

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 总访问次数
    pub accesses: u64,
    /// 缓存命中次数
    pub hits: u64,
    /// 缓存未命中次数
    pub misses: u64,
    /// 设备读取次数（含预读）
    pub device_reads: u64,
    /// 预读的额外块数
    pub prefetched: u64,
    /// 脏块写回次数
    pub writebacks: u64,
    /// 驱逐有效块的次数
    pub evictions: u64,
    /// 失效次数
    pub invalidations: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }
}

/// 块缓存
///
/// 拥有底层设备、缓存池和两个索引。缓存内部不加锁，调用者需要串行化
/// 对同一实例的所有操作（例如每个设备一个缓存，由单个服务循环访问）。
pub struct BlockCache<D> {
    /// 底层设备
    pub(super) device: D,

    /// 缓存池：capacity 个连续的 block_size 字节槽位
    pub(super) pool: Vec<u8>,

    /// 槽位描述符
    pub(super) descs: Vec<BufDesc>,

    /// 块号 -> 描述符
    pub(super) index: HashIndex,

    /// 未借出的描述符，从最久未用到最近释放
    pub(super) lru: IndexList<BufDesc, LruLink>,

    /// 块大小（字节）
    pub(super) block_size: usize,

    /// 每次预读的块数
    pub(super) readahead_depth: usize,

    /// 下一次借出的序号
    pub(super) next_stamp: u64,

    /// 统计信息
    pub(super) stats: CacheStats,
}

impl<D: BlockDevice> BlockCache<D> {
    /// 创建新的块缓存
    ///
    /// # 参数
    ///
    /// * `device` - 底层块设备
    /// * `capacity` - 缓存块数量（>= 1）
    /// * `block_size` - 块大小（>= 512 字节）
    /// * `readahead_depth` - 预读块数，限制在 [1, 8] 且不超过 `capacity`
    ///
    /// # 错误
    ///
    /// - `capacity == 0` 或 `block_size < 512`：[`ErrorKind::InvalidConfig`]（致命）
    /// - 缓存池分配失败：[`ErrorKind::NoMemory`]（可恢复）
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut cache = BlockCache::new(device, 64, 4096, 4)?;  // 64个4KB块，预读4块
    /// ```
    pub fn new(
        device: D,
        capacity: usize,
        block_size: usize,
        readahead_depth: usize,
    ) -> Result<Self> {
        Self::with_config(
            device,
            CacheConfig::default()
                .with_capacity(capacity)
                .with_block_size(block_size)
                .with_readahead(readahead_depth),
        )
    }

    /// 按配置创建块缓存
    pub fn with_config(device: D, config: CacheConfig) -> Result<Self> {
        let CacheConfig {
            capacity,
            block_size,
            readahead_depth,
            hash_buckets,
        } = config;

        if capacity == 0 || block_size < MIN_BLOCK_SIZE || hash_buckets == 0 {
            log::error!(
                "[CACHE] bad params: capacity={} block_size={} hash_buckets={}",
                capacity,
                block_size,
                hash_buckets
            );
            return Err(Error::new(ErrorKind::InvalidConfig, "invalid block cache parameters"));
        }

        let pool_len = capacity
            .checked_mul(block_size)
            .ok_or(Error::new(ErrorKind::InvalidConfig, "block cache pool size overflows"))?;

        let mut pool = Vec::new();
        pool.try_reserve_exact(pool_len).map_err(|_| {
            log::error!("[CACHE] failed to allocate {} byte pool", pool_len);
            Error::new(ErrorKind::NoMemory, "failed to allocate block cache pool")
        })?;
        pool.resize(pool_len, 0);

        let mut descs = Vec::new();
        descs.try_reserve_exact(capacity).map_err(|_| {
            log::error!("[CACHE] failed to allocate {} descriptors", capacity);
            Error::new(ErrorKind::NoMemory, "failed to allocate buffer descriptors")
        })?;
        descs.extend((0..capacity).map(|_| BufDesc::new()));

        let index = HashIndex::new(hash_buckets)?;

        // 所有槽位一开始都是无效的，按槽位顺序挂在 LRU 链表上，可以立即使用
        let mut lru = IndexList::new();
        for id in 0..capacity {
            lru.push_back(&mut descs, id);
        }

        let depth = readahead_depth.clamp(1, MAX_READAHEAD).min(capacity);
        if depth != readahead_depth {
            log::warn!("[CACHE] readahead depth {} clamped to {}", readahead_depth, depth);
        }

        log::debug!(
            "[CACHE] init: {} buffers x {} bytes, readahead={}, buckets={}",
            capacity,
            block_size,
            depth,
            hash_buckets
        );

        Ok(Self {
            device,
            pool,
            descs,
            index,
            lru,
            block_size,
            readahead_depth: depth,
            next_stamp: 1,
            stats: CacheStats::default(),
        })
    }

    /// 获取块
    ///
    /// # 参数
    ///
    /// * `block` - 块号
    /// * `mode` - 未命中时的加载方式，命中时忽略
    ///
    /// # 返回
    ///
    /// 借出的缓存块句柄，调用者独占该块直到 [`BlockCache::put`]。
    ///
    /// # 错误
    ///
    /// - 块已被借出：[`ErrorKind::DoubleCheckout`]
    /// - 所有缓存块都已借出：[`ErrorKind::Exhausted`]
    /// - 读取失败或短读：[`ErrorKind::Io`] / [`ErrorKind::ShortTransfer`]
    pub fn get(&mut self, block: u64, mode: GetMode) -> Result<BufHandle> {
        self.stats.accesses += 1;

        if let Some(id) = self.index.find(&self.descs, block) {
            return self.checkout_hit(id);
        }

        self.stats.misses += 1;
        let offset = self.block_offset(block)?;
        let id = self.take_victim().ok_or_else(|| self.exhausted(block))?;
        self.bind(id, block);
        log::debug!("[CACHE] get block {} MISS -> slot {} ({:?})", block, id, mode);

        match mode {
            GetMode::Read => {
                if let Err(e) = self.read_slot(id, offset) {
                    self.discard(id);
                    return Err(e);
                }
            }
            GetMode::NoRead => {}
            GetMode::Clear => {
                let range = self.slot_range(id);
                self.pool[range].fill(0);
            }
        }

        Ok(self.checkout(id))
    }

    /// 归还缓存块
    ///
    /// 脏块先同步写回设备（写穿），然后移到 LRU 链表尾部。
    ///
    /// # 错误
    ///
    /// - 句柄不是当前借出的块：[`ErrorKind::NotCheckedOut`]
    /// - 写回失败：块保持借出且为脏，可以通过 `invalidate` 回收槽位
    pub fn put(&mut self, handle: BufHandle) -> Result<()> {
        let id = self.validate(&handle)?;

        #[cfg(feature = "verify")]
        self.verify_unmarked_write(id);

        if self.descs[id].is_dirty() {
            let offset = self.block_offset(handle.block)?;
            self.write_slot(id, offset)?;
            self.descs[id].mark_clean();
            self.stats.writebacks += 1;
            log::debug!("[CACHE] put block {} written back", handle.block);
        }

        self.release(id);
        log::trace!("[CACHE] put block {} (slot {})", handle.block, id);
        Ok(())
    }

    /// 使块失效，不写回
    ///
    /// 块的内容被丢弃，槽位移到 LRU 链表头部，成为下一个驱逐对象。
    /// 如果块正被借出，借出也随之结束，原句柄之后再使用会报错。
    ///
    /// # 返回
    ///
    /// 块在缓存中返回 `true`；不在缓存中什么也不做，返回 `false`
    pub fn invalidate(&mut self, block: u64) -> bool {
        let Some(id) = self.index.find(&self.descs, block) else {
            return false;
        };

        if self.descs[id].is_checked_out() {
            log::warn!("[CACHE] invalidate block {} while checked out", block);
        }
        self.discard(id);
        self.stats.invalidations += 1;
        log::debug!("[CACHE] invalidate block {} (slot {})", block, id);
        true
    }

    /// 使一组连续块失效
    ///
    /// # 返回
    ///
    /// 实际失效的块数量
    pub fn invalidate_range(&mut self, from: u64, count: u64) -> usize {
        let end = from.saturating_add(count);
        (from..end).filter(|&block| self.invalidate(block)).count()
    }

    /// 标记为脏，`put` 时写回
    pub fn mark_dirty(&mut self, handle: &BufHandle) -> Result<()> {
        let id = self.validate(handle)?;
        self.descs[id].mark_dirty();
        Ok(())
    }

    /// 标记为干净，`put` 时不写回
    pub fn mark_clean(&mut self, handle: &BufHandle) -> Result<()> {
        let id = self.validate(handle)?;
        self.descs[id].mark_clean();

        #[cfg(feature = "verify")]
        {
            let range = self.slot_range(id);
            self.descs[id].checksum = crc32fast::hash(&self.pool[range]);
        }
        Ok(())
    }

    /// 是否是干净块
    pub fn is_clean(&self, handle: &BufHandle) -> Result<bool> {
        let id = self.validate(handle)?;
        Ok(!self.descs[id].is_dirty())
    }

    /// 借出块的描述符
    pub fn descriptor(&self, handle: &BufHandle) -> Result<&BufDesc> {
        let id = self.validate(handle)?;
        Ok(&self.descs[id])
    }

    /// 只读访问块数据
    pub fn data(&self, handle: &BufHandle) -> Result<&[u8]> {
        let id = self.validate(handle)?;
        Ok(&self.pool[self.slot_range(id)])
    }

    /// 可写访问块数据
    ///
    /// 不会自动标记为脏，修改后需调用 [`BlockCache::mark_dirty`]。
    pub fn data_mut(&mut self, handle: &BufHandle) -> Result<&mut [u8]> {
        let id = self.validate(handle)?;
        let range = self.slot_range(id);
        Ok(&mut self.pool[range])
    }

    /// 块是否在缓存中（不影响 LRU 顺序）
    pub fn contains(&self, block: u64) -> bool {
        self.index.find(&self.descs, block).is_some()
    }

    /// 获取缓存容量
    pub fn capacity(&self) -> usize {
        self.descs.len()
    }

    /// 获取块大小
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 获取预读块数
    pub fn readahead_depth(&self) -> usize {
        self.readahead_depth
    }

    /// 可驱逐的缓存块数量
    pub fn available(&self) -> usize {
        self.lru.len()
    }

    /// 已借出的缓存块数量
    pub fn checked_out(&self) -> usize {
        self.capacity() - self.lru.len()
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 销毁缓存，归还底层设备
    ///
    /// 缓存池和索引一起释放。仍借出的块不会写回。
    pub fn destroy(self) -> D {
        let outstanding = self.checked_out();
        if outstanding > 0 {
            log::warn!("[CACHE] destroyed with {} buffers still checked out", outstanding);
        }
        self.device
    }

    /// 检查所有不变量
    ///
    /// # 错误
    ///
    /// 发现不一致时返回 [`ErrorKind::Corrupted`]
    pub fn check_consistency(&self) -> Result<()> {
        let corrupted = |what: &'static str| -> Result<()> {
            log::error!("[CACHE] consistency check failed: {}", what);
            Err(Error::new(ErrorKind::Corrupted, what))
        };

        for (bucket, id) in self.index.entries(&self.descs) {
            let desc = &self.descs[id];
            if !desc.is_valid() {
                return corrupted("invalid descriptor in hash index");
            }
            if self.index.bucket_of(desc.block) != bucket {
                return corrupted("descriptor hashed into wrong bucket");
            }
        }

        let mut valid = 0;
        for (id, desc) in self.descs.iter().enumerate() {
            if desc.is_dirty() && !desc.is_valid() {
                return corrupted("dirty descriptor is not valid");
            }
            if desc.is_valid() {
                valid += 1;
                if self.index.find(&self.descs, desc.block) != Some(id) {
                    return corrupted("valid descriptor not reachable through hash index");
                }
            }
            if desc.lru_link.is_linked() == desc.is_checked_out() {
                return corrupted("recency list membership disagrees with checkout state");
            }
            if desc.is_dirty() && !desc.is_checked_out() {
                return corrupted("released descriptor is still dirty");
            }
        }

        if self.index.len() != valid {
            return corrupted("hash index size differs from valid descriptor count");
        }

        let walked = self.lru.iter(&self.descs).count();
        if walked != self.lru.len() {
            return corrupted("recency list length mismatch");
        }
        Ok(())
    }

    // 内部辅助方法

    /// 命中：借出已缓存的块
    pub(super) fn checkout_hit(&mut self, id: BufferId) -> Result<BufHandle> {
        let block = self.descs[id].block;
        if self.descs[id].is_checked_out() {
            log::error!("[CACHE] get block {} already checked out", block);
            return Err(Error::new(ErrorKind::DoubleCheckout, "block is already checked out"));
        }

        self.lru.remove(&mut self.descs, id);
        self.stats.hits += 1;
        log::trace!("[CACHE] get block {} HIT (slot {})", block, id);
        Ok(self.checkout(id))
    }

    /// 标记借出并生成句柄
    pub(super) fn checkout(&mut self, id: BufferId) -> BufHandle {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        let desc = &mut self.descs[id];
        desc.flags.insert(BufFlags::CHECKED_OUT);
        desc.stamp = stamp;
        let block = desc.block;

        #[cfg(feature = "verify")]
        {
            let range = self.slot_range(id);
            self.descs[id].checksum = crc32fast::hash(&self.pool[range]);
        }

        BufHandle { id, block, stamp }
    }

    /// 从 LRU 头部取出一个槽位，并从哈希索引中移除其旧块号
    ///
    /// 返回的槽位既不在 LRU 链表上也不在哈希索引中，标志已清空。
    pub(super) fn take_victim(&mut self) -> Option<BufferId> {
        let id = self.lru.pop_front(&mut self.descs)?;
        debug_assert!(!self.descs[id].is_dirty(), "released buffer still dirty");

        if self.index.remove(&mut self.descs, id) {
            self.stats.evictions += 1;
            log::debug!("[CACHE] evict block {} from slot {}", self.descs[id].block, id);
        }
        self.descs[id].flags = BufFlags::empty();
        Some(id)
    }

    /// 把取出的槽位绑定到新块号并插入哈希索引
    pub(super) fn bind(&mut self, id: BufferId, block: u64) {
        let desc = &mut self.descs[id];
        desc.block = block;
        desc.flags = BufFlags::VALID | BufFlags::CHECKED_OUT;
        self.index.insert(&mut self.descs, id);
    }

    /// 归还到 LRU 尾部
    pub(super) fn release(&mut self, id: BufferId) {
        self.descs[id].flags.remove(BufFlags::CHECKED_OUT);
        self.lru.push_back(&mut self.descs, id);
    }

    /// 丢弃槽位内容，放到 LRU 头部
    pub(super) fn discard(&mut self, id: BufferId) {
        self.index.remove(&mut self.descs, id);
        self.lru.remove(&mut self.descs, id);
        self.descs[id].flags = BufFlags::empty();
        self.lru.push_front(&mut self.descs, id);
    }

    pub(super) fn exhausted(&self, block: u64) -> Error {
        log::error!(
            "[CACHE] get block {}: no available buffers, all {} checked out",
            block,
            self.capacity()
        );
        Error::new(ErrorKind::Exhausted, "no available buffers in block cache")
    }

    /// 句柄必须对应当前借出
    pub(super) fn validate(&self, handle: &BufHandle) -> Result<BufferId> {
        match self.descs.get(handle.id) {
            Some(desc)
                if desc.is_checked_out()
                    && desc.stamp == handle.stamp
                    && desc.block == handle.block =>
            {
                Ok(handle.id)
            }
            _ => {
                log::error!(
                    "[CACHE] block {} (slot {}) is not checked out",
                    handle.block,
                    handle.id
                );
                Err(Error::new(ErrorKind::NotCheckedOut, "buffer is not checked out"))
            }
        }
    }

    pub(super) fn slot_range(&self, id: BufferId) -> Range<usize> {
        let start = id * self.block_size;
        start..start + self.block_size
    }

    /// 块在设备上的字节偏移
    pub(super) fn block_offset(&self, block: u64) -> Result<u64> {
        block
            .checked_mul(self.block_size as u64)
            .ok_or(Error::new(ErrorKind::InvalidInput, "block number out of addressable range"))
    }

    pub(super) fn read_slot(&mut self, id: BufferId, offset: u64) -> Result<()> {
        let range = self.slot_range(id);
        self.stats.device_reads += 1;
        read_exact_at(&mut self.device, offset, &mut self.pool[range])
    }

    fn write_slot(&mut self, id: BufferId, offset: u64) -> Result<()> {
        let range = self.slot_range(id);
        write_exact_at(&mut self.device, offset, &self.pool[range])
    }

    #[cfg(feature = "verify")]
    fn verify_unmarked_write(&self, id: BufferId) {
        let desc = &self.descs[id];
        if !desc.is_dirty() && crc32fast::hash(&self.pool[self.slot_range(id)]) != desc.checksum {
            log::warn!(
                "[CACHE] block {} modified but not marked dirty, changes will be lost",
                desc.block
            );
        }
    }
}

impl<D> core::fmt::Debug for BlockCache<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockCache")
            .field("capacity", &self.descs.len())
            .field("available", &self.lru.len())
            .field("block_size", &self.block_size)
            .field("readahead_depth", &self.readahead_depth)
            .field("hash_buckets", &self.index.bucket_count())
            .field("stats", &self.stats)
            .finish()
    }
}
