//! 块号哈希索引
//!
//! 按 `block % bucket_count` 分桶，桶内是以 [`HashLink`] 相连的侵入式链表。
//! 新块插入桶头。

use super::buffer::{BufDesc, BufferId, HashLink};
use crate::error::{Error, ErrorKind, Result};
use crate::utils::IndexList;
use alloc::vec::Vec;

pub(crate) struct HashIndex {
    buckets: Vec<IndexList<BufDesc, HashLink>>,
}

impl HashIndex {
    /// 创建 `bucket_count` 个空桶
    pub fn new(bucket_count: usize) -> Result<Self> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(bucket_count)
            .map_err(|_| Error::new(ErrorKind::NoMemory, "failed to allocate hash buckets"))?;
        buckets.extend((0..bucket_count).map(|_| IndexList::new()));
        Ok(Self { buckets })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_of(&self, block: u64) -> usize {
        (block % self.buckets.len() as u64) as usize
    }

    /// 查找缓存该块的描述符
    pub fn find(&self, descs: &[BufDesc], block: u64) -> Option<BufferId> {
        self.buckets[self.bucket_of(block)]
            .iter(descs)
            .find(|&id| descs[id].block == block)
    }

    /// 以描述符当前的块号插入
    pub fn insert(&mut self, descs: &mut [BufDesc], id: BufferId) {
        let bucket = self.bucket_of(descs[id].block);
        self.buckets[bucket].push_front(descs, id);
    }

    /// 按描述符当前的块号移除，不在索引中返回 `false`
    pub fn remove(&mut self, descs: &mut [BufDesc], id: BufferId) -> bool {
        if !descs[id].hash_link.is_linked() {
            return false;
        }
        let bucket = self.bucket_of(descs[id].block);
        self.buckets[bucket].remove(descs, id)
    }

    /// 索引中的条目总数
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.len()).sum()
    }

    /// 遍历所有 (桶号, 描述符)
    pub fn entries<'a>(
        &'a self,
        descs: &'a [BufDesc],
    ) -> impl Iterator<Item = (usize, BufferId)> + 'a {
        self.buckets
            .iter()
            .enumerate()
            .flat_map(move |(b, list)| list.iter(descs).map(move |id| (b, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn descs(blocks: &[u64]) -> Vec<BufDesc> {
        blocks
            .iter()
            .map(|&b| {
                let mut d = BufDesc::new();
                d.block = b;
                d
            })
            .collect()
    }

    #[test]
    fn test_insert_find_remove() {
        let mut d = descs(&[3, 11, 19, 4]);
        let mut index = HashIndex::new(8).unwrap();
        for id in 0..4 {
            index.insert(&mut d, id);
        }

        // 3, 11, 19 落在同一个桶
        assert_eq!(index.bucket_of(3), index.bucket_of(19));
        assert_eq!(index.find(&d, 11), Some(1));
        assert_eq!(index.find(&d, 19), Some(2));
        assert_eq!(index.find(&d, 4), Some(3));
        assert_eq!(index.find(&d, 27), None);
        assert_eq!(index.len(), 4);

        assert!(index.remove(&mut d, 1));
        assert!(!index.remove(&mut d, 1));
        assert_eq!(index.find(&d, 11), None);
        assert_eq!(index.find(&d, 3), Some(0));
        assert_eq!(index.find(&d, 19), Some(2));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_entries_report_bucket() {
        let mut d = descs(&[5, 13]);
        let mut index = HashIndex::new(8).unwrap();
        index.insert(&mut d, 0);
        index.insert(&mut d, 1);

        let entries: Vec<_> = index.entries(&d).collect();
        // 桶内新插入的在前
        assert_eq!(entries, [(5, 1), (5, 0)]);
    }
}
