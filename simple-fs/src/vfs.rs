//! # 文件操作层
//!
//! 在 [`InodeStore`]、[`BlockStore`] 与句柄表之上实现
//! create/delete/open/close/read/write/seek。
//!
//! - 按名字的操作线性扫描在用的 inode；
//! - 按句柄的操作先确认 inode 仍在使用，再把偏移换算为
//!   `(块索引, 块内偏移) = (offset / BLOCK_SIZE, offset % BLOCK_SIZE)`。
//!
//! 写入要么全部落盘，要么不留任何痕迹：
//! 越界检查与数据块分配都在改动任何数据之前完成，
//! 分配失败时回收本次分配的块。

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

use block_dev::BlockDevice;
use spin::Mutex;

use crate::handle::{FileHandle, HandleTable};
use crate::layout::Inode;
use crate::store::{BlockStore, InodeStore};
use crate::{Config, Disk, Error, NamePolicy, Result};

pub struct SimpleFileSystem<S = Disk> {
    store: S,
    handles: HandleTable,
    name_policy: NamePolicy,
}

/// 文件的元信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub inode: u32,
    pub name: String,
    pub size: u32,
    /// 占用的数据块数
    pub blocks: usize,
}

/// 资源占用情况
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub free_inodes: usize,
    pub total_inodes: usize,
    pub free_blocks: usize,
    pub total_blocks: usize,
    pub open_files: usize,
    pub max_open_files: usize,
}

impl SimpleFileSystem<Disk> {
    /// 按 `config` 格式化设备并挂载
    pub fn format(block_device: Arc<dyn BlockDevice>, config: &Config) -> Result<Self> {
        config.validate()?;
        let disk = Disk::format(block_device, config.geometry)?;
        Self::with_store(disk, config)
    }

    /// 挂载已格式化的设备：磁盘几何以超级块为准，`config` 只提供运行时选项。
    /// 宿主通常不知道镜像的几何，两者不一致是常态。
    pub fn mount(block_device: Arc<dyn BlockDevice>, config: &Config) -> Result<Self> {
        let disk = Disk::open(block_device)?;
        if disk.geometry() != config.geometry {
            log::debug!(
                "on-disk geometry {:?} differs from the configured one, using the former",
                disk.geometry()
            );
        }
        Self::with_store(disk, config)
    }
}

impl<S: InodeStore + BlockStore> SimpleFileSystem<S> {
    pub fn with_store(store: S, config: &Config) -> Result<Self> {
        if config.max_open_files == 0 {
            return Err(Error::InvalidConfig);
        }

        Ok(Self {
            store,
            handles: HandleTable::new(config.max_open_files),
            name_policy: config.name_policy,
        })
    }

    /// 交给互斥锁保护，供多线程宿主串行调用
    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }

    /// 新建空文件并返回其 inode ID，不会顺带打开它
    pub fn create(&mut self, name: &str) -> Result<u32> {
        let name = self.file_name(name)?;
        // 确认没有已创建的同名文件
        if self.find(name).is_some() {
            return Err(Error::NameCollision);
        }

        let inode_id = self.store.alloc_inode().ok_or(Error::NoSpace)?;
        let direct_blocks = self.store.geometry().direct_blocks;
        self.store
            .store_inode(inode_id, &Inode::new(name, direct_blocks));

        log::debug!("create {name:?}: inode {inode_id}");
        Ok(inode_id)
    }

    /// 删除文件并回收其数据块与 inode；文件不存在时什么也不做
    pub fn delete(&mut self, name: &str) {
        let Some(inode_id) = self.lookup(name) else {
            log::debug!("delete {name:?}: no such file");
            return;
        };

        // 槽位回收之前，不能再有句柄指向它
        let released = self.handles.release_inode(inode_id);
        let inode = self.store.load_inode(inode_id);
        for block_id in inode.allocated_blocks() {
            self.store.free_block(block_id);
        }
        self.store.free_inode(inode_id);

        log::debug!(
            "delete {name:?}: inode {inode_id}, {} blocks, {released} handles released",
            inode.allocated_blocks().count()
        );
    }

    pub fn open(&mut self, name: &str) -> Result<usize> {
        let inode_id = self.lookup(name).ok_or(Error::NotFound)?;
        let fd = self
            .handles
            .insert(inode_id)
            .ok_or(Error::TooManyOpenFiles)?;

        log::debug!("open {name:?}: handle {fd}");
        Ok(fd)
    }

    /// 释放句柄；无效句柄什么也不做
    pub fn close(&mut self, fd: usize) {
        if self.handles.remove(fd).is_none() {
            log::debug!("close {fd}: not an open handle");
        }
    }

    /// 从当前偏移读出数据填充 `buf`，返回读出的字节数。
    ///
    /// 遇到未分配的块即视为文件末尾，此时读出的字节可能少于 `buf.len()`。
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let (handle, inode) = self.handle(fd)?;
        let block_size = self.store.geometry().block_size;

        let mut offset = handle.offset;
        // 已读取多少字节
        let mut read_size = 0;
        while read_size < buf.len() {
            let block_index = offset / block_size;
            let block_offset = offset % block_size;
            let Some(block_id) = inode.block(block_index) else {
                break;
            };

            let len = (buf.len() - read_size).min(block_size - block_offset);
            let block = self.store.load_block(block_id);
            buf[read_size..read_size + len]
                .copy_from_slice(&block[block_offset..block_offset + len]);

            read_size += len;
            offset += len;
        }

        self.set_offset(fd, offset);
        Ok(read_size)
    }

    /// 从当前偏移写入整个 `buf`。
    ///
    /// 成功时文件大小增加 `buf.len()`，偏移随之前进；
    /// 失败时 inode 与所有数据块保持调用前的样子。
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<()> {
        let (handle, mut inode) = self.handle(fd)?;
        if buf.is_empty() {
            return Ok(());
        }

        let geometry = self.store.geometry();
        let block_size = geometry.block_size;
        let start = handle.offset;
        let end = start + buf.len();

        // 末字节所在块的索引不小于 K
        if end > geometry.max_file_size() {
            log::warn!(
                "write {fd}: {} bytes at offset {start} exceed {} bytes",
                buf.len(),
                geometry.max_file_size()
            );
            return Err(Error::FileTooLarge);
        }

        let blocks = self.prepare_blocks(&mut inode, start / block_size..=(end - 1) / block_size)?;

        let mut offset = start;
        let mut written_size = 0;
        for (block_id, fresh) in blocks {
            let block_offset = offset % block_size;
            let len = (buf.len() - written_size).min(block_size - block_offset);

            // 只覆盖了部分内容的旧块要先读出，保留写入范围之外的字节
            let mut block = if fresh || len == block_size {
                vec![0; block_size]
            } else {
                self.store.load_block(block_id)
            };
            block[block_offset..block_offset + len]
                .copy_from_slice(&buf[written_size..written_size + len]);
            self.store.store_block(block_id, &block);

            written_size += len;
            offset += len;
        }

        inode.file_size = inode.file_size.saturating_add(buf.len() as u32);
        self.store.store_inode(handle.inode_id, &inode);
        self.set_offset(fd, offset);

        log::trace!("write {fd}: {} bytes at offset {start}", buf.len());
        Ok(())
    }

    /// 把偏移移动 `delta` 字节，返回新的偏移。
    /// 新偏移须落在 `[0, K * BLOCK_SIZE)` 内，否则偏移不变。
    pub fn seek(&mut self, fd: usize, delta: isize) -> Result<usize> {
        let (handle, _) = self.handle(fd)?;
        let max_file_size = self.store.geometry().max_file_size();

        let offset = handle
            .offset
            .checked_add_signed(delta)
            .filter(|&offset| offset < max_file_size)
            .ok_or(Error::OutOfRange)?;

        self.set_offset(fd, offset);
        Ok(offset)
    }

    /// 句柄的当前偏移
    pub fn tell(&self, fd: usize) -> Result<usize> {
        self.handle(fd).map(|(handle, _)| handle.offset)
    }

    pub fn stat(&self, name: &str) -> Result<Stat> {
        let inode_id = self.lookup(name).ok_or(Error::NotFound)?;
        Ok(Self::to_stat(inode_id, &self.store.load_inode(inode_id)))
    }

    /// 所有文件，按 inode ID 排列
    pub fn list(&self) -> Vec<Stat> {
        let free_list = self.store.load_freelist();
        free_list
            .inodes_in_use()
            .map(|inode_id| Self::to_stat(inode_id, &self.store.load_inode(inode_id)))
            .collect()
    }

    pub fn usage(&self) -> Usage {
        let free_list = self.store.load_freelist();
        Usage {
            free_inodes: free_list.free_inodes(),
            total_inodes: free_list.inodes.len(),
            free_blocks: free_list.free_blocks(),
            total_blocks: free_list.blocks.len(),
            open_files: self.handles.open_count(),
            max_open_files: self.handles.capacity(),
        }
    }

    /// 在用 inode 的快照
    pub fn inode(&self, inode_id: u32) -> Option<Inode> {
        if inode_id as usize >= self.store.geometry().num_inodes {
            return None;
        }
        let inode = self.store.load_inode(inode_id);
        inode.is_in_use().then_some(inode)
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 卸载：丢弃所有句柄，交还底层存储
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S: InodeStore + BlockStore> SimpleFileSystem<S> {
    /// 校验文件名，并按策略处理超长的名字
    fn file_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        if name.is_empty() || name.contains('\0') {
            return Err(Error::InvalidName);
        }

        let capacity = self.store.geometry().name_capacity;
        if name.len() <= capacity {
            return Ok(name);
        }

        match self.name_policy {
            NamePolicy::Reject => Err(Error::NameTooLong),
            NamePolicy::Truncate => {
                let end = (0..=capacity)
                    .rev()
                    .find(|&end| name.is_char_boundary(end))
                    .unwrap_or(0);
                match &name[..end] {
                    "" => Err(Error::InvalidName),
                    truncated => Ok(truncated),
                }
            }
        }
    }

    /// 在用的 inode 中按名字查找，返回其 ID
    fn find(&self, name: &str) -> Option<u32> {
        let free_list = self.store.load_freelist();
        free_list
            .inodes_in_use()
            .find(|&inode_id| self.store.load_inode(inode_id).name == name)
    }

    /// 按用户给出的名字查找；不合法的名字不可能存在
    fn lookup(&self, name: &str) -> Option<u32> {
        let name = self.file_name(name).ok()?;
        self.find(name)
    }

    /// 取出句柄及其 inode，并确认 inode 仍在使用
    fn handle(&self, fd: usize) -> Result<(FileHandle, Inode)> {
        let handle = *self.handles.get(fd).ok_or(Error::InvalidHandle)?;
        let inode = self.store.load_inode(handle.inode_id);
        if !inode.is_in_use() {
            log::warn!("handle {fd}: inode {} is gone", handle.inode_id);
            return Err(Error::InvalidHandle);
        }
        Ok((handle, inode))
    }

    fn set_offset(&mut self, fd: usize, offset: usize) {
        if let Some(handle) = self.handles.get_mut(fd) {
            handle.offset = offset;
        }
    }

    /// 为 `block_indices` 中尚未分配的块分配数据块，
    /// 按顺序返回每块的编号以及是否为本次新分配。
    ///
    /// 数据块耗尽时回收本次分配的全部块；`inode` 的改动由调用者丢弃。
    fn prepare_blocks(
        &mut self,
        inode: &mut Inode,
        block_indices: RangeInclusive<usize>,
    ) -> Result<Vec<(u32, bool)>> {
        let mut blocks = Vec::with_capacity(block_indices.clone().count());

        for block_index in block_indices {
            if let Some(block_id) = inode.block(block_index) {
                blocks.push((block_id, false));
                continue;
            }

            let Some(block_id) = self.store.alloc_block() else {
                let fresh: Vec<u32> = blocks
                    .iter()
                    .filter(|(_, fresh)| *fresh)
                    .map(|(block_id, _)| *block_id)
                    .collect();
                log::warn!(
                    "out of data blocks at block index {block_index}, rolling back {} blocks",
                    fresh.len()
                );
                for block_id in fresh {
                    self.store.free_block(block_id);
                }
                return Err(Error::NoSpace);
            };

            inode.direct_blocks[block_index] = Some(block_id);
            blocks.push((block_id, true));
        }

        Ok(blocks)
    }

    fn to_stat(inode_id: u32, inode: &Inode) -> Stat {
        Stat {
            inode: inode_id,
            name: inode.name.clone(),
            size: inode.file_size,
            blocks: inode.allocated_blocks().count(),
        }
    }
}
