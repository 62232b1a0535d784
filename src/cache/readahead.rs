//! 预读
//!
//! 一次读入 `readahead_depth` 个连续块，只把第一个借给调用者，
//! 其余的立即归还到 LRU 尾部，等待顺序访问。

use super::block_cache::BlockCache;
use super::buffer::{BufFlags, BufHandle, BufferId};
use crate::block::BlockDevice;
use crate::consts::MAX_READAHEAD;
use crate::error::{Error, ErrorKind, Result};

impl<D: BlockDevice> BlockCache<D> {
    /// 获取块并预读后续块
    ///
    /// - 起始块已在缓存中：按命中路径直接返回，不预读（已缓存说明不是新的顺序访问）
    /// - 否则逐个检查 `start..start + depth`：已缓存的跳过，未缓存的选出驱逐槽位
    ///   并预先标记为借出，避免在同一批中被再次选中
    /// - 每个待读块各读一次设备，然后归还除第一个以外的所有块
    ///
    /// 任何一个待读块取不到槽位都是致命错误（同 `get`），已选出的槽位先回滚。
    /// 超出可寻址范围的后续块不预读。
    pub fn get_with_readahead(&mut self, start: u64) -> Result<BufHandle> {
        self.stats.accesses += 1;

        if let Some(id) = self.index.find(&self.descs, start) {
            return self.checkout_hit(id);
        }
        self.stats.misses += 1;

        let depth = self.readahead_depth;
        let mut staged: [Option<(BufferId, u64)>; MAX_READAHEAD] = [None; MAX_READAHEAD];
        let mut starved = None;

        for (t, slot) in staged.iter_mut().enumerate().take(depth) {
            let target = start
                .checked_add(t as u64)
                .ok_or(Error::new(ErrorKind::InvalidInput, "block number out of addressable range"))
                .and_then(|block| self.block_offset(block).map(|offset| (block, offset)));
            let (block, offset) = match target {
                Ok(target) => target,
                Err(e) if t == 0 => return Err(e),
                Err(_) => {
                    log::debug!("[RA] run from {} ends at the addressable limit", start);
                    break;
                }
            };

            if t > 0 && self.index.find(&self.descs, block).is_some() {
                continue;
            }

            let Some(id) = self.take_victim() else {
                starved = Some(block);
                break;
            };

            // 尚未读入，暂不插入哈希索引
            let desc = &mut self.descs[id];
            desc.block = block;
            desc.flags = BufFlags::CHECKED_OUT;
            *slot = Some((id, offset));
        }

        if let Some(block) = starved {
            for (id, _) in staged.iter().take(depth).flatten() {
                self.discard(*id);
            }
            return Err(self.exhausted(block));
        }

        for (t, entry) in staged.iter().enumerate().take(depth) {
            let Some((id, offset)) = *entry else {
                continue;
            };

            if let Err(e) = self.read_slot(id, offset) {
                for (id, _) in staged.iter().take(depth).flatten() {
                    self.discard(*id);
                }
                return Err(e);
            }

            self.descs[id].flags.insert(BufFlags::VALID);
            self.index.insert(&mut self.descs, id);
            if t > 0 {
                self.stats.prefetched += 1;
            }
        }

        for (id, _) in staged.iter().take(depth).skip(1).flatten() {
            self.release(*id);
        }

        log::debug!(
            "[RA] block {}: read {} of {} blocks",
            start,
            staged.iter().flatten().count(),
            depth
        );

        match staged[0] {
            Some((id, _)) => Ok(self.checkout(id)),
            None => Err(Error::new(ErrorKind::Corrupted, "readahead lost its first block")),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::block::mock::{stamp_of, MockDevice};
    use crate::cache::{BlockCache, GetMode};
    use crate::error::ErrorKind;

    const BS: usize = 512;

    fn cache(capacity: usize, depth: usize) -> BlockCache<MockDevice> {
        BlockCache::new(MockDevice::stamped(64, BS), capacity, BS, depth).unwrap()
    }

    #[test]
    fn test_readahead_loads_run() {
        let mut cache = cache(8, 4);
        let h = cache.get_with_readahead(10).unwrap();

        assert_eq!(h.block(), 10);
        assert_eq!(stamp_of(cache.data(&h).unwrap()), 10);
        assert_eq!(cache.device().reads, 4);
        for b in 10..14 {
            assert!(cache.contains(b));
        }
        assert_eq!(cache.checked_out(), 1);
        assert_eq!(cache.stats().prefetched, 3);
        cache.check_consistency().unwrap();
        cache.put(h).unwrap();

        // 预读的块命中，无需再次读取
        cache.device_mut().reset_counters();
        for b in 11..14 {
            let h = cache.get(b, GetMode::Read).unwrap();
            assert_eq!(stamp_of(cache.data(&h).unwrap()), b);
            cache.put(h).unwrap();
        }
        assert_eq!(cache.device().reads, 0);
    }

    #[test]
    fn test_cached_start_short_circuits() {
        let mut cache = cache(8, 4);
        let h = cache.get(0, GetMode::Read).unwrap();
        cache.put(h).unwrap();
        cache.device_mut().reset_counters();

        let h = cache.get_with_readahead(0).unwrap();
        assert_eq!(cache.device().reads, 0);
        assert_eq!(stamp_of(cache.data(&h).unwrap()), 0);
        assert!(!cache.contains(1));
        cache.put(h).unwrap();
    }

    #[test]
    fn test_cached_followers_are_skipped() {
        let mut cache = cache(8, 4);
        for b in [21, 23] {
            let h = cache.get(b, GetMode::Read).unwrap();
            cache.put(h).unwrap();
        }
        cache.device_mut().reset_counters();

        let h = cache.get_with_readahead(20).unwrap();
        assert_eq!(cache.device().read_log, [20 * BS as u64, 22 * BS as u64]);
        cache.put(h).unwrap();
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_prefetched_blocks_released_in_order() {
        let mut cache = cache(4, 4);
        let h = cache.get_with_readahead(0).unwrap();
        cache.put(h).unwrap();

        // LRU: 1, 2, 3, 0
        let h = cache.get(40, GetMode::Read).unwrap();
        assert!(!cache.contains(1));
        assert!(cache.contains(0));
        cache.put(h).unwrap();
    }

    #[test]
    fn test_start_checked_out_is_fatal() {
        let mut cache = cache(8, 4);
        let h = cache.get(5, GetMode::Read).unwrap();

        let err = cache.get_with_readahead(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoubleCheckout);
        cache.put(h).unwrap();
    }

    #[test]
    fn test_exhausted_mid_batch_is_fatal() {
        let mut cache = cache(4, 4);
        let h0 = cache.get(50, GetMode::Read).unwrap();
        let h1 = cache.get(51, GetMode::Read).unwrap();
        cache.device_mut().reset_counters();

        let err = cache.get_with_readahead(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exhausted);
        assert!(err.is_fatal());
        assert_eq!(cache.device().reads, 0);
        assert!(!cache.contains(0));
        assert!(!cache.contains(1));
        assert_eq!(cache.available(), 2);
        cache.check_consistency().unwrap();

        cache.put(h0).unwrap();
        cache.put(h1).unwrap();
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_exhausted_on_start_is_fatal() {
        let mut cache = cache(2, 2);
        let h0 = cache.get(50, GetMode::Read).unwrap();
        let h1 = cache.get(51, GetMode::Read).unwrap();

        let err = cache.get_with_readahead(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exhausted);
        cache.check_consistency().unwrap();

        cache.put(h0).unwrap();
        cache.put(h1).unwrap();
    }

    #[test]
    fn test_read_failure_rolls_back_batch() {
        let mut cache = cache(8, 4);
        let h = cache.get(30, GetMode::Read).unwrap();
        cache.put(h).unwrap();

        // 块 62 之后超出设备末尾，第三个块短读
        let err = cache.get_with_readahead(62).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShortTransfer);
        for b in 62..66 {
            assert!(!cache.contains(b));
        }
        assert!(cache.contains(30));
        assert_eq!(cache.available(), 8);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_depth_one_behaves_like_get() {
        let mut cache = cache(4, 1);
        let h = cache.get_with_readahead(3).unwrap();
        assert_eq!(cache.device().reads, 1);
        assert!(!cache.contains(4));
        cache.put(h).unwrap();
    }

    #[test]
    fn test_start_out_of_range_rejected() {
        let mut cache = cache(4, 4);
        let err = cache.get_with_readahead(u64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(cache.available(), 4);
        assert_eq!(cache.device().reads, 0);
        cache.check_consistency().unwrap();
    }

    #[test]
    fn test_cached_start_near_limit_hits() {
        let mut cache = cache(4, 4);
        let start = u64::MAX / BS as u64 - 1;
        let h = cache.get(start, GetMode::NoRead).unwrap();
        cache.put(h).unwrap();

        let h = cache.get_with_readahead(start).unwrap();
        assert_eq!(h.block(), start);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.device().reads, 0);
        cache.put(h).unwrap();
    }
}
