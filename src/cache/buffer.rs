//! 缓存块描述符
//!
//! 每个缓存池槽位对应一个 [`BufDesc`]。描述符在缓存构造时一次性创建，
//! 之后只回收其逻辑内容（块号、标志），从不单独释放。
//!
//! 描述符通过内嵌的两个 [`Link`] 同时挂在 LRU 链表和哈希桶上，
//! 两条链表都以槽位下标相连，不使用指针。

use crate::consts::{BLK_CLEAR, BLK_NO_READ, BLK_READ};
use crate::error::{Error, ErrorKind};
use crate::utils::{Link, ListAdapter};
use bitflags::bitflags;

/// 缓存块 ID（缓存池中的槽位下标）
pub type BufferId = usize;

bitflags! {
    /// 缓存块标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufFlags: u8 {
        /// 块号有效，可以被哈希索引匹配
        const VALID       = 0x01;
        /// 数据已修改，需要写回
        const DIRTY       = 0x02;
        /// 已借给调用者（get 与 put 之间）
        const CHECKED_OUT = 0x04;
    }
}

/// `get` 的加载方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GetMode {
    /// 不在缓存中则从设备读取
    Read,
    /// 分配缓存块但不读取，调用者会覆盖整个块
    NoRead,
    /// 分配缓存块并清零
    Clear,
}

impl TryFrom<i32> for GetMode {
    type Error = Error;

    fn try_from(opt: i32) -> Result<Self, Error> {
        match opt {
            BLK_READ => Ok(GetMode::Read),
            BLK_NO_READ => Ok(GetMode::NoRead),
            BLK_CLEAR => Ok(GetMode::Clear),
            _ => Err(Error::new(ErrorKind::InvalidInput, "unknown get_block option")),
        }
    }
}

/// 缓存块描述符
#[derive(Debug)]
pub struct BufDesc {
    /// 当前缓存的块号（仅在 VALID 时有意义）
    pub(crate) block: u64,

    /// 块状态标志
    pub(crate) flags: BufFlags,

    /// 本次借出的序号，用于识别过期句柄
    pub(crate) stamp: u64,

    /// LRU 链表链接
    pub(crate) lru_link: Link,

    /// 哈希桶链接
    pub(crate) hash_link: Link,

    /// 借出时的数据校验和
    #[cfg(feature = "verify")]
    pub(crate) checksum: u32,
}

impl BufDesc {
    pub(crate) const fn new() -> Self {
        Self {
            block: 0,
            flags: BufFlags::empty(),
            stamp: 0,
            lru_link: Link::new(),
            hash_link: Link::new(),
            #[cfg(feature = "verify")]
            checksum: 0,
        }
    }

    /// 缓存的块号
    pub fn block(&self) -> u64 {
        self.block
    }

    /// 块号是否有效
    pub fn is_valid(&self) -> bool {
        self.flags.contains(BufFlags::VALID)
    }

    /// 是否是脏块
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(BufFlags::DIRTY)
    }

    /// 是否已借出
    pub fn is_checked_out(&self) -> bool {
        self.flags.contains(BufFlags::CHECKED_OUT)
    }

    /// 标记为脏
    pub(crate) fn mark_dirty(&mut self) {
        self.flags.insert(BufFlags::DIRTY);
    }

    /// 标记为干净
    pub(crate) fn mark_clean(&mut self) {
        self.flags.remove(BufFlags::DIRTY);
    }
}

/// LRU 链表适配器
pub(crate) struct LruLink;

impl ListAdapter<BufDesc> for LruLink {
    fn link(node: &BufDesc) -> &Link {
        &node.lru_link
    }

    fn link_mut(node: &mut BufDesc) -> &mut Link {
        &mut node.lru_link
    }
}

/// 哈希桶适配器
pub(crate) struct HashLink;

impl ListAdapter<BufDesc> for HashLink {
    fn link(node: &BufDesc) -> &Link {
        &node.hash_link
    }

    fn link_mut(node: &mut BufDesc) -> &mut Link {
        &mut node.hash_link
    }
}

/// 已借出缓存块的句柄
///
/// 由 `get` / `get_with_readahead` 返回，交给 `put` 归还。句柄不可复制，
/// 每次借出都有唯一序号，归还后或块被 `invalidate` 后再使用会得到
/// [`ErrorKind::NotCheckedOut`]。
#[derive(Debug, PartialEq, Eq)]
pub struct BufHandle {
    pub(crate) id: BufferId,
    pub(crate) block: u64,
    pub(crate) stamp: u64,
}

impl BufHandle {
    /// 块号
    pub fn block(&self) -> u64 {
        self.block
    }

    /// 缓存池槽位
    pub fn id(&self) -> BufferId {
        self.id
    }
}
