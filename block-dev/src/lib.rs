//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、U盘，或者一段内存；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! `simple-fs` 只通过块设备驱动读写块设备。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
///
/// 读写的缓冲区长度必须恰好为 [`BlockDevice::block_size`]。
pub trait BlockDevice: Send + Sync + Any {
    fn read_block(&self, block_id: usize, buf: &mut [u8]);
    fn write_block(&self, block_id: usize, buf: &[u8]);

    /// 每块的字节数
    fn block_size(&self) -> usize;

    /// 设备总块数
    fn num_blocks(&self) -> usize;
}
