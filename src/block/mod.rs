//! 块设备抽象
//!
//! block/device.rs 定义缓存消费的设备接口，并负责把短读/短写转换为致命错误
//! block/handle.rs 提供 RAII 风格的缓存块访问
//! block/file.rs 在 std 环境下把文件句柄包装成块设备

pub(crate) mod device;
mod handle;

#[cfg(feature = "std")]
mod file;

#[cfg(test)]
pub(crate) mod mock;

pub use device::BlockDevice;
pub use handle::Block;

#[cfg(feature = "std")]
pub use file::FileDevice;
