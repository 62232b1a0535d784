//! blockdev_core: 定长块缓存
//!
//! 位于文件系统实现与原始块设备之间的块缓存库，旨在提供：
//! - **定长缓存池**：构造后不再分配内存
//! - **O(1) 查找与驱逐**：哈希索引 + LRU 链表，均为基于下标的侵入式链表
//! - **写穿**：脏块在归还时立即写回
//! - **可选预读**：一次读入连续块，适合顺序访问
//! - **可测试的致命错误**：破坏缓存契约的情况以错误返回，由嵌入系统决定如何处理
//!
//! # 示例
//!
//! ```rust,ignore
//! use blockdev_core::{BlockCache, BlockDevice, GetMode, Result};
//!
//! // 实现 BlockDevice trait
//! struct MyDevice {
//!     // ...
//! }
//!
//! impl BlockDevice for MyDevice {
//!     // 实现 read_at / write_at
//!     // ...
//! }
//!
//! fn main() -> Result<()> {
//!     let mut cache = BlockCache::new(MyDevice::new(), 64, 4096, 4)?;
//!
//!     let buf = cache.get(0, GetMode::Read)?;
//!     println!("First byte: {:02x}", cache.data(&buf)?[0]);
//!     cache.put(buf)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象和 RAII 块句柄
//! - [`cache`] - 块缓存
//! - [`consts`] - 常量定义
//! - [`utils`] - 基于下标的侵入式链表
//! - [`c_api`] - C API 兼容层（可选）

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 常量定义
pub mod consts;

/// 块缓存
pub mod cache;

/// 基于下标的侵入式链表
pub mod utils;

// ===== C API 兼容层（可选）=====

/// C API 兼容层
///
/// 提供与旧版块缓存库同名的函数接口。
#[cfg(feature = "c-api")]
pub mod c_api;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::{Block, BlockDevice};

#[cfg(feature = "std")]
pub use block::FileDevice;

// Cache
pub use cache::{
    BlockCache, BufDesc, BufFlags, BufHandle, BufferId, CacheConfig, CacheStats, GetMode,
    DEFAULT_CACHE_SIZE,
};

// C API（当启用时）
#[cfg(feature = "c-api")]
pub use c_api::block::{
    block_isclean, block_markclean, block_markdirty, free_cache, get_block, get_block_readahead,
    init_block_cache, invalidate_block, put_block,
};
