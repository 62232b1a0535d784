//! 块缓存常量定义

/// 最小块大小（512 字节，一个扇区）
pub const MIN_BLOCK_SIZE: usize = 512;

/// 默认块大小（4096 字节）
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// 默认缓存块数量
pub const DEFAULT_CACHE_SIZE: usize = 256;

/// 预读块数上限
pub const MAX_READAHEAD: usize = 8;

/// 默认哈希桶数量
pub const BUF_HASH_CNT: usize = 128;

/// C API: get_block 选项，不在缓存中则从磁盘读取
pub const BLK_READ: i32 = 0;

/// C API: get_block 选项，分配缓存块但不读取磁盘
pub const BLK_NO_READ: i32 = 1;

/// C API: get_block 选项，返回清零的缓存块
pub const BLK_CLEAR: i32 = 2;
