//! C API 兼容层
//!
//! 保留旧版块缓存库的函数名（`init_block_cache`、`get_block`、`put_block` 等），
//! 内部实现全部调用 [`crate::cache::BlockCache`] 的方法。

pub mod block;
