//! 基于下标的侵入式双向链表
//!
//! 节点保存在调用者持有的定长数组中，链表只记录首尾下标。
//! 每个节点内嵌一个或多个 [`Link`]，通过实现 [`ListAdapter`] 告诉链表使用哪一个，
//! 因此同一个节点可以同时挂在多条链表上（例如 LRU 链表和哈希桶）。
//!
//! 所有操作都是 O(1)（遍历除外），不做任何堆分配。

use core::fmt;
use core::marker::PhantomData;

/// 节点内嵌的链接字段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    prev: Option<usize>,
    next: Option<usize>,
    linked: bool,
}

impl Link {
    /// 创建未链接的 Link
    pub const fn new() -> Self {
        Self {
            prev: None,
            next: None,
            linked: false,
        }
    }

    /// 是否已挂在某条链表上
    pub const fn is_linked(&self) -> bool {
        self.linked
    }
}

/// 节点链接接口
///
/// 用户结构体包含 [`Link`] 字段，并通过实现此 Trait 告诉链表如何访问该字段。
pub trait ListAdapter<T> {
    /// 获取节点的 Link 字段
    fn link(node: &T) -> &Link;

    /// 获取节点的 Link 字段（可变）
    fn link_mut(node: &mut T) -> &mut Link;
}

/// 侵入式双向链表
pub struct IndexList<T, A> {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    _marker: PhantomData<fn(&T) -> A>,
}

impl<T, A> fmt::Debug for IndexList<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexList")
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("len", &self.len)
            .finish()
    }
}

impl<T, A> Default for IndexList<T, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, A> IndexList<T, A> {
    /// 创建空链表
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// 链表长度
    pub const fn len(&self) -> usize {
        self.len
    }

    /// 链表是否为空
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 头节点
    pub const fn front(&self) -> Option<usize> {
        self.head
    }

    /// 尾节点
    pub const fn back(&self) -> Option<usize> {
        self.tail
    }
}

impl<T, A: ListAdapter<T>> IndexList<T, A> {
    /// 追加到尾部
    pub fn push_back(&mut self, nodes: &mut [T], idx: usize) {
        debug_assert!(!A::link(&nodes[idx]).linked, "node {} already linked", idx);

        let old_tail = self.tail;
        {
            let link = A::link_mut(&mut nodes[idx]);
            link.prev = old_tail;
            link.next = None;
            link.linked = true;
        }
        match old_tail {
            Some(t) => A::link_mut(&mut nodes[t]).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// 插入到头部
    pub fn push_front(&mut self, nodes: &mut [T], idx: usize) {
        debug_assert!(!A::link(&nodes[idx]).linked, "node {} already linked", idx);

        let old_head = self.head;
        {
            let link = A::link_mut(&mut nodes[idx]);
            link.prev = None;
            link.next = old_head;
            link.linked = true;
        }
        match old_head {
            Some(h) => A::link_mut(&mut nodes[h]).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
        self.len += 1;
    }

    /// 从链表中摘除节点
    ///
    /// 节点必须挂在这条链表上。未链接的节点返回 `false`。
    pub fn remove(&mut self, nodes: &mut [T], idx: usize) -> bool {
        let link = *A::link(&nodes[idx]);
        if !link.linked {
            return false;
        }

        match link.prev {
            Some(p) => A::link_mut(&mut nodes[p]).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => A::link_mut(&mut nodes[n]).prev = link.prev,
            None => self.tail = link.prev,
        }
        *A::link_mut(&mut nodes[idx]) = Link::new();
        self.len -= 1;
        true
    }

    /// 摘除并返回头节点
    pub fn pop_front(&mut self, nodes: &mut [T]) -> Option<usize> {
        let head = self.head?;
        self.remove(nodes, head);
        Some(head)
    }

    /// 从头到尾遍历
    pub fn iter<'a>(&self, nodes: &'a [T]) -> Iter<'a, T, A> {
        Iter {
            nodes,
            current: self.head,
            _marker: PhantomData,
        }
    }
}

/// 链表迭代器
pub struct Iter<'a, T, A> {
    nodes: &'a [T],
    current: Option<usize>,
    _marker: PhantomData<fn(&T) -> A>,
}

impl<'a, T, A: ListAdapter<T>> Iterator for Iter<'a, T, A> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let idx = self.current?;
        self.current = A::link(&self.nodes[idx]).next;
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Node {
        a: Link,
        b: Link,
    }

    struct ByA;
    struct ByB;

    impl ListAdapter<Node> for ByA {
        fn link(node: &Node) -> &Link {
            &node.a
        }
        fn link_mut(node: &mut Node) -> &mut Link {
            &mut node.a
        }
    }

    impl ListAdapter<Node> for ByB {
        fn link(node: &Node) -> &Link {
            &node.b
        }
        fn link_mut(node: &mut Node) -> &mut Link {
            &mut node.b
        }
    }

    fn nodes(n: usize) -> Vec<Node> {
        (0..n).map(|_| Node::default()).collect()
    }

    #[test]
    fn test_push_and_pop_order() {
        let mut n = nodes(4);
        let mut list: IndexList<Node, ByA> = IndexList::new();

        list.push_back(&mut n, 1);
        list.push_back(&mut n, 2);
        list.push_front(&mut n, 0);
        list.push_back(&mut n, 3);
        assert_eq!(list.len(), 4);
        assert_eq!(list.iter(&n).collect::<Vec<_>>(), [0, 1, 2, 3]);

        assert_eq!(list.pop_front(&mut n), Some(0));
        assert_eq!(list.pop_front(&mut n), Some(1));
        assert_eq!(list.front(), Some(2));
        assert_eq!(list.back(), Some(3));
        assert!(!n[0].a.is_linked());
    }

    #[test]
    fn test_remove_middle_and_ends() {
        let mut n = nodes(5);
        let mut list: IndexList<Node, ByA> = IndexList::new();
        for i in 0..5 {
            list.push_back(&mut n, i);
        }

        assert!(list.remove(&mut n, 2));
        assert!(list.remove(&mut n, 0));
        assert!(list.remove(&mut n, 4));
        assert!(!list.remove(&mut n, 4));
        assert_eq!(list.iter(&n).collect::<Vec<_>>(), [1, 3]);
        assert_eq!(list.front(), Some(1));
        assert_eq!(list.back(), Some(3));

        assert!(list.remove(&mut n, 1));
        assert!(list.remove(&mut n, 3));
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.pop_front(&mut n), None);
    }

    #[test]
    fn test_two_links_are_independent() {
        let mut n = nodes(3);
        let mut la: IndexList<Node, ByA> = IndexList::new();
        let mut lb: IndexList<Node, ByB> = IndexList::new();

        for i in 0..3 {
            la.push_back(&mut n, i);
            lb.push_front(&mut n, i);
        }
        la.remove(&mut n, 1);

        assert_eq!(la.iter(&n).collect::<Vec<_>>(), [0, 2]);
        assert_eq!(lb.iter(&n).collect::<Vec<_>>(), [2, 1, 0]);
        assert!(n[1].b.is_linked());
    }
}
