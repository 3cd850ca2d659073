//! # 文件句柄表
//!
//! 定长的槽位表，每个槽位要么空闲，要么绑定一个 inode 及其读写偏移。
//! 句柄即槽位的索引。

use alloc::vec;
use alloc::vec::Vec;

/// 一个打开的文件实例
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHandle {
    pub inode_id: u32,
    /// **文件**内的偏移量
    pub offset: usize,
}

#[derive(Debug)]
pub struct HandleTable {
    slots: Vec<Option<FileHandle>>,
}

impl HandleTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 绑定第一个空槽位，偏移置零，并返回槽位的索引
    pub fn insert(&mut self, inode_id: u32) -> Option<usize> {
        let fd = self.slots.iter().position(Option::is_none)?;
        self.slots[fd] = Some(FileHandle {
            inode_id,
            offset: 0,
        });
        Some(fd)
    }

    #[inline]
    pub fn get(&self, fd: usize) -> Option<&FileHandle> {
        self.slots.get(fd)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, fd: usize) -> Option<&mut FileHandle> {
        self.slots.get_mut(fd)?.as_mut()
    }

    /// 释放槽位；越界或本就空闲时返回空
    pub fn remove(&mut self, fd: usize) -> Option<FileHandle> {
        self.slots.get_mut(fd)?.take()
    }

    /// 释放所有绑定到 `inode_id` 的槽位，返回释放的个数
    pub fn release_inode(&mut self, inode_id: u32) -> usize {
        let mut released = 0;
        for slot in &mut self.slots {
            if slot.is_some_and(|handle| handle.inode_id == inode_id) {
                *slot = None;
                released += 1;
            }
        }
        released
    }

    /// 已绑定的槽位数
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
