//! # 磁盘块管理器层
//!
//! 构建出磁盘的布局并使用：[`Disk`] 在块设备上实现 [`InodeStore`] 与 [`BlockStore`]。
//! 超级块在内存中常驻一份，每次分配或回收后整体写回。

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use crate::layout::{FreeList, Inode, Status, SuperBlock};
use crate::store::{BlockStore, InodeStore};
use crate::{Error, Geometry, Result};

pub struct Disk {
    block_device: Arc<dyn BlockDevice>,
    super_block: SuperBlock,
}

impl Disk {
    /// 在设备上建立空的文件系统，覆盖其占据的全部块
    pub fn format(block_device: Arc<dyn BlockDevice>, geometry: Geometry) -> Result<Self> {
        geometry.validate()?;
        Self::check_device(&block_device, &geometry).map_err(|_| Error::InvalidConfig)?;

        let zeroes = vec![0; geometry.block_size];
        for block_id in 0..geometry.total_blocks() {
            block_device.write_block(block_id, &zeroes);
        }

        let disk = Self {
            block_device,
            super_block: SuperBlock::new(geometry),
        };
        disk.sync_super_block();

        // 全零的 inode 会被解读为指向 0 号块，需要写入哨兵
        let empty = Inode::empty(geometry.direct_blocks);
        let inode_size = geometry.inode_size();
        let mut inode_block = vec![0; geometry.block_size];
        for slot in inode_block
            .chunks_exact_mut(inode_size)
            .take(geometry.inodes_per_block())
        {
            empty.encode(&geometry, slot);
        }
        for block_index in 0..geometry.inode_blocks() {
            disk.block_device
                .write_block(geometry.inode_area_start() + block_index, &inode_block);
        }

        log::info!(
            "formatted: {} inodes, {} data blocks of {} bytes, {} direct blocks per file",
            geometry.num_inodes,
            geometry.num_data_blocks,
            geometry.block_size,
            geometry.direct_blocks,
        );

        Ok(disk)
    }

    /// 加载设备上已有的文件系统
    pub fn open(block_device: Arc<dyn BlockDevice>) -> Result<Self> {
        let block_size = block_device.block_size();
        let mut block = vec![0; block_size];
        block_device.read_block(0, &mut block);

        let geometry = SuperBlock::read_geometry(&block)?;
        Self::check_device(&block_device, &geometry)?;

        let mut bytes = Vec::with_capacity(geometry.super_blocks() * block_size);
        bytes.extend_from_slice(&block);
        for block_id in 1..geometry.super_blocks() {
            block_device.read_block(block_id, &mut block);
            bytes.extend_from_slice(&block);
        }
        let disk = Self {
            block_device,
            super_block: SuperBlock::decode(&bytes)?,
        };
        disk.check_inodes()?;

        let free_list = &disk.super_block.free_list;
        log::info!(
            "opened: {}/{} inodes free, {}/{} data blocks free",
            free_list.free_inodes(),
            geometry.num_inodes,
            free_list.free_blocks(),
            geometry.num_data_blocks,
        );

        Ok(disk)
    }

    #[inline]
    pub fn block_device(&self) -> &Arc<dyn BlockDevice> {
        &self.block_device
    }

    fn check_device(block_device: &Arc<dyn BlockDevice>, geometry: &Geometry) -> Result<()> {
        if block_device.block_size() != geometry.block_size
            || block_device.num_blocks() < geometry.total_blocks()
        {
            return Err(Error::InvalidImage);
        }
        Ok(())
    }

    /// 在用 inode 引用的数据块都得在范围内，且已标记为在用
    fn check_inodes(&self) -> Result<()> {
        let free_list = &self.super_block.free_list;
        for inode_id in free_list.inodes_in_use() {
            let inode = self.load_inode(inode_id);
            let dangling = inode.allocated_blocks().find(|&block_id| {
                free_list.blocks.get(block_id as usize) != Some(&Status::InUse)
            });
            if let Some(block_id) = dangling {
                log::warn!("inode {inode_id} refers to unallocated data block {block_id}");
                return Err(Error::InvalidImage);
            }
        }
        Ok(())
    }

    fn sync_super_block(&self) {
        let block_size = self.super_block.geometry.block_size;
        for (block_id, block) in self.super_block.encode().chunks(block_size).enumerate() {
            self.block_device.write_block(block_id, block);
        }
    }

    fn read_device_block(&self, block_id: usize) -> Vec<u8> {
        let mut block = vec![0; self.super_block.geometry.block_size];
        self.block_device.read_block(block_id, &mut block);
        block
    }

    /// 数据块编号对应的设备块ID
    fn data_block_id(&self, block_id: u32) -> usize {
        let geometry = &self.super_block.geometry;
        assert!(
            (block_id as usize) < geometry.num_data_blocks,
            "data block {block_id} out of range"
        );
        geometry.data_area_start() + block_id as usize
    }
}

impl InodeStore for Disk {
    #[inline]
    fn geometry(&self) -> Geometry {
        self.super_block.geometry
    }

    fn load_freelist(&self) -> FreeList {
        self.super_block.free_list.clone()
    }

    fn store_freelist(&mut self, free_list: &FreeList) {
        self.super_block.free_list.clone_from(free_list);
        self.sync_super_block();
    }

    fn alloc_inode(&mut self) -> Option<u32> {
        let inode_id = FreeList::take_first(&mut self.super_block.free_list.inodes)?;
        self.sync_super_block();
        log::trace!("alloc inode {inode_id}");
        Some(inode_id)
    }

    fn free_inode(&mut self, inode_id: u32) {
        let status = &mut self.super_block.free_list.inodes[inode_id as usize];
        // 编号一定得在用
        assert_eq!(*status, Status::InUse, "inode {inode_id} is not in use");
        *status = Status::Free;

        let empty = Inode::empty(self.super_block.geometry.direct_blocks);
        self.store_inode(inode_id, &empty);
        self.sync_super_block();
        log::trace!("free inode {inode_id}");
    }

    fn load_inode(&self, inode_id: u32) -> Inode {
        let geometry = self.super_block.geometry;
        assert!((inode_id as usize) < geometry.num_inodes);

        let (block_id, block_offset) = geometry.inode_pos(inode_id);
        let block = self.read_device_block(block_id);
        Inode::decode(&geometry, &block[block_offset..])
    }

    fn store_inode(&mut self, inode_id: u32, inode: &Inode) {
        let geometry = self.super_block.geometry;
        assert!((inode_id as usize) < geometry.num_inodes);

        let (block_id, block_offset) = geometry.inode_pos(inode_id);
        let mut block = self.read_device_block(block_id);
        inode.encode(&geometry, &mut block[block_offset..]);
        self.block_device.write_block(block_id, &block);
    }
}

impl BlockStore for Disk {
    fn alloc_block(&mut self) -> Option<u32> {
        let block_id = FreeList::take_first(&mut self.super_block.free_list.blocks)?;
        self.sync_super_block();
        log::trace!("alloc data block {block_id}");
        Some(block_id)
    }

    fn free_block(&mut self, block_id: u32) {
        let device_block_id = self.data_block_id(block_id);
        let status = &mut self.super_block.free_list.blocks[block_id as usize];
        assert_eq!(*status, Status::InUse, "data block {block_id} is not in use");
        *status = Status::Free;

        // 回收的块清零，避免旧数据被新文件读到
        let zeroes = vec![0; self.super_block.geometry.block_size];
        self.block_device.write_block(device_block_id, &zeroes);
        self.sync_super_block();
        log::trace!("free data block {block_id}");
    }

    fn load_block(&self, block_id: u32) -> Vec<u8> {
        self.read_device_block(self.data_block_id(block_id))
    }

    fn store_block(&mut self, block_id: u32, data: &[u8]) {
        let device_block_id = self.data_block_id(block_id);
        self.block_device.write_block(device_block_id, data);
    }
}
