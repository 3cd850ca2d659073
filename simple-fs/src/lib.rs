#![no_std]

extern crate alloc;

/* simple-fs 的整体架构，自上而下 */

// 文件操作层：实现文件创建、打开、读写、寻址等操作
mod vfs;

// 文件句柄表
mod handle;

// 存储接口：文件操作层所依赖的 inode 存储与数据块存储
pub mod store;

// 磁盘块管理器层：在块设备上实现存储接口
mod disk;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
pub mod layout;

mod config;
mod error;

pub use block_dev::BlockDevice;

pub use self::{
    config::{Config, Geometry, NamePolicy},
    disk::Disk,
    error::{Error, Result},
    handle::FileHandle,
    layout::Inode,
    vfs::{SimpleFileSystem, Stat, Usage},
};

pub const MAGIC: u32 = 0x5346_5331;

/// 从镜像开头的字节中读出块大小，供宿主构造块设备之前使用
pub fn probe_block_size(header: &[u8]) -> Result<usize> {
    layout::SuperBlock::read_geometry(header).map(|geometry| geometry.block_size)
}
