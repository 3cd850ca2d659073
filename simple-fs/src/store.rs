//! # 存储接口
//!
//! 文件操作层只通过这两个特质访问持久化状态：
//! [`InodeStore`] 管理 inode 表与空闲表，[`BlockStore`] 管理数据块。
//! 实现者负责分配簿记的正确性，文件操作层负责其上的不变式。

use alloc::vec::Vec;

use crate::Geometry;
use crate::layout::{FreeList, Inode};

pub trait InodeStore {
    fn geometry(&self) -> Geometry;

    fn load_freelist(&self) -> FreeList;
    fn store_freelist(&mut self, free_list: &FreeList);

    /// 占用一个空闲的 inode 槽位，没有则返回空
    fn alloc_inode(&mut self) -> Option<u32>;
    fn free_inode(&mut self, inode_id: u32);

    fn load_inode(&self, inode_id: u32) -> Inode;
    fn store_inode(&mut self, inode_id: u32, inode: &Inode);
}

pub trait BlockStore {
    /// 占用一个空闲数据块，没有则返回空
    fn alloc_block(&mut self) -> Option<u32>;
    fn free_block(&mut self, block_id: u32);

    /// 读出整块，长度为块大小
    fn load_block(&self, block_id: u32) -> Vec<u8>;
    fn store_block(&mut self, block_id: u32, data: &[u8]);
}
