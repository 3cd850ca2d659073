//! # 磁盘数据结构层
//!
//! simple-fs 的磁盘布局：
//! 超级块(含 inode 与数据块的空闲表) | inode 区域 | 数据块区域
//!
//! 所有整数均以小端序存储。

mod super_block;
pub use super_block::{FreeList, HEADER_SIZE, Status, SuperBlock};

mod inode;
pub use inode::Inode;

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}

#[inline]
fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
