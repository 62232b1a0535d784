//! 块缓存模块
//!
//! 位于文件系统与原始块设备之间的定长块缓存。
//!
//! # 主要组件
//!
//! - [`BlockCache`] - 缓存控制器：`get` / `get_with_readahead` / `put` / `invalidate`
//! - [`BufHandle`] - 借出缓存块的句柄
//! - [`BufDesc`] - 缓存块描述符
//! - [`CacheConfig`] - 构造参数
//! - [`CacheStats`] - 缓存统计信息
//!
//! # 设计原理
//!
//! 缓存池在构造时一次性分配 `capacity * block_size` 字节，之后不再分配。
//! 两个索引共享同一组描述符：
//!
//! 1. **哈希索引**：`block % buckets` 分桶，O(1) 平均查找
//! 2. **LRU 链表**：未借出的描述符，头部是下一个驱逐对象
//!
//! 两者都是以槽位下标相连的侵入式链表（见 [`crate::utils::list`]），
//! 插入和删除都是 O(1)，没有按请求的堆分配。
//!
//! 借出的块不在 LRU 链表上，因此不会被驱逐；同一块不能同时借出两次。
//! `put` 时立即写回脏块（写穿），驱逐从不需要写盘。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use blockdev_core::cache::{BlockCache, GetMode};
//!
//! // 64 个 4KB 块，预读 4 块
//! let mut cache = BlockCache::new(device, 64, 4096, 4)?;
//!
//! let buf = cache.get(100, GetMode::Read)?;
//! cache.data_mut(&buf)?[0] = 42;
//! cache.mark_dirty(&buf)?;
//! cache.put(buf)?;  // 立即写回
//!
//! let stats = cache.stats();
//! println!("hit rate: {:.2}", stats.hit_rate());
//! ```

mod block_cache;
mod buffer;
mod config;
mod index;
mod readahead;

pub use block_cache::{BlockCache, CacheStats};
pub use buffer::{BufDesc, BufFlags, BufHandle, BufferId, GetMode};
pub use config::CacheConfig;
pub use crate::consts::DEFAULT_CACHE_SIZE;
