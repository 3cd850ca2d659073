//! # 配置
//!
//! 块大小、inode 数量、直接索引块数等常量都作为配置项给出，
//! 其中 [`Geometry`] 部分会写入超级块，其余只在运行时生效。

use crate::layout::HEADER_SIZE;
use crate::{Error, Result};

/// 文件名超出定长字段时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NamePolicy {
    /// 返回 [`Error::NameTooLong`]
    #[default]
    Reject,
    /// 在不超过容量的最后一个字符边界处截断
    Truncate,
}

/// 磁盘几何：决定磁盘布局，格式化时持久化到超级块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub block_size: usize,
    pub num_inodes: usize,
    pub num_data_blocks: usize,
    /// 每个 inode 的直接索引块数，即文件最多占用的块数
    pub direct_blocks: usize,
    /// 文件名字段的字节数
    pub name_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub geometry: Geometry,
    pub max_open_files: usize,
    pub name_policy: NamePolicy,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            block_size: 64,
            num_inodes: 8,
            num_data_blocks: 50,
            direct_blocks: 4,
            name_capacity: 8,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            max_open_files: 20,
            name_policy: NamePolicy::Reject,
        }
    }
}

impl Config {
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.geometry.block_size = block_size;
        self
    }

    pub fn with_inodes(mut self, num_inodes: usize) -> Self {
        self.geometry.num_inodes = num_inodes;
        self
    }

    pub fn with_data_blocks(mut self, num_data_blocks: usize) -> Self {
        self.geometry.num_data_blocks = num_data_blocks;
        self
    }

    pub fn with_direct_blocks(mut self, direct_blocks: usize) -> Self {
        self.geometry.direct_blocks = direct_blocks;
        self
    }

    pub fn with_name_capacity(mut self, name_capacity: usize) -> Self {
        self.geometry.name_capacity = name_capacity;
        self
    }

    pub fn with_max_open_files(mut self, max_open_files: usize) -> Self {
        self.max_open_files = max_open_files;
        self
    }

    pub fn with_name_policy(mut self, name_policy: NamePolicy) -> Self {
        self.name_policy = name_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.max_open_files == 0 {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

/* 磁盘布局：超级块区域 | inode 区域 | 数据块区域 */
impl Geometry {
    pub fn validate(&self) -> Result<()> {
        // u32::MAX 留作“未分配”的哨兵
        let fits_u32 = |n: usize| u32::try_from(n).is_ok_and(|n| n < u32::MAX);

        let valid = self.block_size >= HEADER_SIZE
            && [
                self.num_inodes,
                self.num_data_blocks,
                self.direct_blocks,
                self.name_capacity,
            ]
            .iter()
            .all(|&n| n > 0)
            && [
                self.block_size,
                self.num_inodes,
                self.num_data_blocks,
                self.direct_blocks,
                self.name_capacity,
            ]
            .into_iter()
            .all(fits_u32)
            && self
                .direct_blocks
                .checked_mul(self.block_size)
                .is_some_and(fits_u32)
            && self.inode_size() <= self.block_size;

        if valid {
            Ok(())
        } else {
            Err(Error::InvalidConfig)
        }
    }

    /// 文件大小上限(字节)：K * BLOCK_SIZE
    #[inline]
    pub fn max_file_size(&self) -> usize {
        self.direct_blocks * self.block_size
    }

    /// 磁盘上一个 inode 的字节数：
    /// name | status | pad | file_size(u32) | direct(u32 * K)
    #[inline]
    pub fn inode_size(&self) -> usize {
        self.file_size_offset() + 4 + 4 * self.direct_blocks
    }

    #[inline]
    pub(crate) fn file_size_offset(&self) -> usize {
        (self.name_capacity + 1).next_multiple_of(4)
    }

    #[inline]
    pub fn inodes_per_block(&self) -> usize {
        self.block_size / self.inode_size()
    }

    /// 超级块区域占据块数：头部加上 inode 与数据块的状态字节
    #[inline]
    pub fn super_blocks(&self) -> usize {
        (HEADER_SIZE + self.num_inodes + self.num_data_blocks).div_ceil(self.block_size)
    }

    #[inline]
    pub fn inode_area_start(&self) -> usize {
        self.super_blocks()
    }

    #[inline]
    pub fn inode_blocks(&self) -> usize {
        self.num_inodes.div_ceil(self.inodes_per_block())
    }

    #[inline]
    pub fn data_area_start(&self) -> usize {
        self.inode_area_start() + self.inode_blocks()
    }

    /// 整个文件系统占据的设备块数
    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.data_area_start() + self.num_data_blocks
    }

    /// 通过ID获取 inode 在磁盘上的位置：**块ID**以及**块内偏移**
    pub fn inode_pos(&self, inode_id: u32) -> (usize, usize) {
        let inode_id = inode_id as usize;
        let per_block = self.inodes_per_block();
        let block_id = self.inode_area_start() + inode_id / per_block;
        let block_offset = inode_id % per_block * self.inode_size();

        (block_id, block_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let geometry = Geometry::default();
        assert_eq!(geometry.validate(), Ok(()));

        // 8 字节名字 + 状态 => 12，再加 size 与 4 个块号
        assert_eq!(geometry.inode_size(), 32);
        assert_eq!(geometry.inodes_per_block(), 2);
        // 32 + 8 + 50 = 90 字节的超级块
        assert_eq!(geometry.super_blocks(), 2);
        assert_eq!(geometry.inode_blocks(), 4);
        assert_eq!(geometry.data_area_start(), 6);
        assert_eq!(geometry.total_blocks(), 56);
        assert_eq!(geometry.max_file_size(), 256);
        assert_eq!(geometry.inode_pos(3), (3, 32));
    }

    #[test]
    fn reject_bad_geometry() {
        let tiny_blocks = Config::default().with_block_size(16);
        assert_eq!(tiny_blocks.validate(), Err(Error::InvalidConfig));

        let no_inodes = Config::default().with_inodes(0);
        assert_eq!(no_inodes.validate(), Err(Error::InvalidConfig));

        // 一个 inode 装不进一个块
        let fat_inode = Config::default().with_direct_blocks(64);
        assert_eq!(fat_inode.validate(), Err(Error::InvalidConfig));

        let no_handles = Config::default().with_max_open_files(0);
        assert_eq!(no_handles.validate(), Err(Error::InvalidConfig));
    }
}
