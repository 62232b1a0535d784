//! 通用数据结构

pub mod list;

pub use list::{IndexList, Link, ListAdapter};
