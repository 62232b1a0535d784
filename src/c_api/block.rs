//! C API 兼容层 - 块缓存操作
//!
//! 仅在命名上保留 C 风格，所有函数都是 Rust 方法的简单包装。
//! 旧接口中的 panic 在这里以致命错误返回。

use crate::block::BlockDevice;
use crate::cache::{BlockCache, BufHandle, GetMode};
use crate::Result;

/// C API: init_block_cache
///
/// 创建块缓存。内部调用 `BlockCache::new`。
pub fn init_block_cache<D: BlockDevice>(
    dev: D,
    buf_cnt: usize,
    block_size: usize,
    read_ahead_blocks: usize,
) -> Result<BlockCache<D>> {
    BlockCache::new(dev, buf_cnt, block_size, read_ahead_blocks)
}

/// C API: free_cache
///
/// 释放块缓存，归还设备。内部调用 `BlockCache::destroy`。
pub fn free_cache<D: BlockDevice>(cache: BlockCache<D>) -> D {
    cache.destroy()
}

/// C API: get_block
///
/// `opt` 取 `BLK_READ`、`BLK_NO_READ` 或 `BLK_CLEAR`，其他值返回 `InvalidInput`。
pub fn get_block<D: BlockDevice>(
    cache: &mut BlockCache<D>,
    block: u64,
    opt: i32,
) -> Result<BufHandle> {
    let mode = GetMode::try_from(opt)?;
    cache.get(block, mode)
}

/// C API: get_block_readahead
pub fn get_block_readahead<D: BlockDevice>(
    cache: &mut BlockCache<D>,
    start_block: u64,
) -> Result<BufHandle> {
    cache.get_with_readahead(start_block)
}

/// C API: put_block
pub fn put_block<D: BlockDevice>(cache: &mut BlockCache<D>, buf: BufHandle) -> Result<()> {
    cache.put(buf)
}

/// C API: invalidate_block
pub fn invalidate_block<D: BlockDevice>(cache: &mut BlockCache<D>, block: u64) {
    cache.invalidate(block);
}

/// C API: block_markdirty
pub fn block_markdirty<D: BlockDevice>(cache: &mut BlockCache<D>, buf: &BufHandle) -> Result<()> {
    cache.mark_dirty(buf)
}

/// C API: block_markclean
pub fn block_markclean<D: BlockDevice>(cache: &mut BlockCache<D>, buf: &BufHandle) -> Result<()> {
    cache.mark_clean(buf)
}

/// C API: block_isclean
pub fn block_isclean<D: BlockDevice>(cache: &BlockCache<D>, buf: &BufHandle) -> Result<bool> {
    cache.is_clean(buf)
}
