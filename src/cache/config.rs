//! 缓存配置

use crate::consts::{BUF_HASH_CNT, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_SIZE};

/// 块缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// 缓存块数量（>= 1）
    pub capacity: usize,
    /// 块大小（字节，>= 512）
    pub block_size: usize,
    /// 预读块数（会被限制在 [1, 8] 且不超过 capacity）
    pub readahead_depth: usize,
    /// 哈希桶数量（>= 1）
    pub hash_buckets: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            readahead_depth: 1,
            hash_buckets: BUF_HASH_CNT,
        }
    }
}

impl CacheConfig {
    /// 设置缓存块数量
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// 设置块大小
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// 设置预读块数
    pub fn with_readahead(mut self, depth: usize) -> Self {
        self.readahead_depth = depth;
        self
    }

    /// 设置哈希桶数量
    pub fn with_hash_buckets(mut self, buckets: usize) -> Self {
        self.hash_buckets = buckets;
        self
    }
}
