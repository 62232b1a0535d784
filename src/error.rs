//! 错误类型定义
//!
//! 提供块缓存操作的错误类型。
//!
//! 缓存本身从不终止进程。破坏缓存契约的情况（池耗尽、短读写、重复借出等）
//! 以 [`Error::is_fatal`] 为真的错误返回，由嵌入系统决定是中止进程还是重启子系统。

use core::fmt;

/// 块缓存操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 设备报告 I/O 错误
    Io,
    /// 设备传输字节数不足（短读/短写）
    ShortTransfer,
    /// 构造参数无效
    InvalidConfig,
    /// 无效参数（未改动缓存状态）
    InvalidInput,
    /// 所有缓存块都已借出，无可驱逐的块
    Exhausted,
    /// 同一个块被重复借出
    DoubleCheckout,
    /// 释放或访问了未借出的块（或已失效的句柄）
    NotCheckedOut,
    /// 内部索引不一致
    Corrupted,
    /// 分配缓存池失败
    NoMemory,
}

impl ErrorKind {
    /// 是否属于不可恢复的错误
    pub const fn is_fatal(self) -> bool {
        !matches!(self, ErrorKind::NoMemory | ErrorKind::InvalidInput)
    }
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 是否为致命错误
    ///
    /// 致命错误表示缓存契约被破坏或设备故障，调用者不应重试。
    pub const fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::new(ErrorKind::Exhausted, "x").is_fatal());
        assert!(Error::new(ErrorKind::ShortTransfer, "x").is_fatal());
        assert!(Error::new(ErrorKind::DoubleCheckout, "x").is_fatal());
        assert!(Error::new(ErrorKind::NotCheckedOut, "x").is_fatal());
        assert!(Error::new(ErrorKind::InvalidConfig, "x").is_fatal());
        assert!(!Error::new(ErrorKind::NoMemory, "x").is_fatal());
        assert!(!Error::new(ErrorKind::InvalidInput, "x").is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::Io, "device failed");
        assert_eq!(alloc::format!("{}", err), "Io: device failed");
        assert_eq!(err.message(), "device failed");
    }
}
