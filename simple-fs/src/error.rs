use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// 已有同名文件
    NameCollision,
    NotFound,
    /// inode 或数据块耗尽
    NoSpace,
    TooManyOpenFiles,
    /// 句柄越界、未绑定，或其 inode 已被删除
    InvalidHandle,
    /// 写入会越过直接索引块的上限
    FileTooLarge,
    /// 寻址越过 `[0, K * BLOCK_SIZE)`
    OutOfRange,
    NameTooLong,
    /// 空文件名或含有 `\0`
    InvalidName,
    InvalidConfig,
    /// 磁盘镜像不是合法的 simple-fs
    InvalidImage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NameCollision => "a file with this name already exists",
            Self::NotFound => "no such file",
            Self::NoSpace => "no space left on device",
            Self::TooManyOpenFiles => "too many open files",
            Self::InvalidHandle => "invalid file handle",
            Self::FileTooLarge => "file too large",
            Self::OutOfRange => "offset out of range",
            Self::NameTooLong => "file name too long",
            Self::InvalidName => "invalid file name",
            Self::InvalidConfig => "invalid file system configuration",
            Self::InvalidImage => "not a simple-fs image",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for Error {}
