//! 块句柄 - RAII 风格的块访问

use crate::block::BlockDevice;
use crate::cache::{BlockCache, BufHandle, GetMode};
use crate::error::{Error, ErrorKind, Result};

/// 块句柄
///
/// 提供 RAII 风格的块访问：
/// - 获取时从缓存借出块（未命中时按模式加载）
/// - 持有期间独占 `&mut BlockCache`，同一时刻只能存在一个 Block
/// - 通过 `with_data_mut` 修改时自动标记为脏
/// - 丢弃时归还缓存块，脏块立即写回
///
/// # 示例
///
/// ```rust,ignore
/// // 读取块
/// let block = Block::get(&mut cache, 0)?;
/// block.with_data(|data| {
///     println!("First byte: {:02x}", data[0]);
/// })?;
///
/// // 修改块
/// let mut block = Block::get(&mut cache, 1)?;
/// block.with_data_mut(|data| {
///     data[0] = 0x42;
/// })?;
/// block.release()?;  // 写回并检查错误
/// ```
pub struct Block<'a, D: BlockDevice> {
    cache: &'a mut BlockCache<D>,
    handle: Option<BufHandle>,
}

impl<'a, D: BlockDevice> Block<'a, D> {
    /// 获取块（不在缓存中则读取）
    pub fn get(cache: &'a mut BlockCache<D>, block: u64) -> Result<Self> {
        Self::get_with_mode(cache, block, GetMode::Read)
    }

    /// 获取块（不读取数据）
    ///
    /// 调用者会覆盖整个块，不需要把磁盘上的旧数据读进来。
    pub fn get_noread(cache: &'a mut BlockCache<D>, block: u64) -> Result<Self> {
        Self::get_with_mode(cache, block, GetMode::NoRead)
    }

    /// 获取清零的块
    pub fn get_clear(cache: &'a mut BlockCache<D>, block: u64) -> Result<Self> {
        Self::get_with_mode(cache, block, GetMode::Clear)
    }

    /// 获取块并预读后续块
    pub fn get_readahead(cache: &'a mut BlockCache<D>, block: u64) -> Result<Self> {
        let handle = cache.get_with_readahead(block)?;
        Ok(Self {
            cache,
            handle: Some(handle),
        })
    }

    fn get_with_mode(cache: &'a mut BlockCache<D>, block: u64, mode: GetMode) -> Result<Self> {
        let handle = cache.get(block, mode)?;
        Ok(Self {
            cache,
            handle: Some(handle),
        })
    }

    /// 获取块号
    pub fn block(&self) -> u64 {
        self.handle.as_ref().map(BufHandle::block).unwrap_or_default()
    }

    fn handle(&self) -> Result<&BufHandle> {
        self.handle
            .as_ref()
            .ok_or(Error::new(ErrorKind::NotCheckedOut, "block already released"))
    }

    /// 访问块数据（只读）
    pub fn with_data<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let handle = self.handle()?;
        Ok(f(self.cache.data(handle)?))
    }

    /// 访问块数据（可写）
    ///
    /// 通过闭包修改块数据，自动标记为脏。
    pub fn with_data_mut<F, R>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let handle = self
            .handle
            .as_ref()
            .ok_or(Error::new(ErrorKind::NotCheckedOut, "block already released"))?;
        let result = f(self.cache.data_mut(handle)?);
        self.cache.mark_dirty(handle)?;
        Ok(result)
    }

    /// 是否是干净块
    pub fn is_clean(&self) -> Result<bool> {
        self.cache.is_clean(self.handle()?)
    }

    /// 放弃修改，归还时不写回
    pub fn mark_clean(&mut self) -> Result<()> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(Error::new(ErrorKind::NotCheckedOut, "block already released"))?;
        self.cache.mark_clean(handle)
    }

    /// 手动释放块（消费 self）
    ///
    /// 与 drop 不同，写回错误会返回给调用者。
    pub fn release(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.cache.put(handle),
            None => Ok(()),
        }
    }
}

/// 实现 Drop trait，自动释放块
impl<'a, D: BlockDevice> Drop for Block<'a, D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let block = handle.block();
            // drop 不能返回 Result
            if let Err(e) = self.cache.put(handle) {
                log::error!("[Block::drop] release of block {} failed: {}", block, e);
            }
        }
    }
}
