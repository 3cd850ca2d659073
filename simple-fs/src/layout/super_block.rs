use alloc::vec;
use alloc::vec::Vec;

use super::{read_u32, write_u32};
use crate::MAGIC;
use crate::{Error, Geometry, Result};

/// 超级块头部的字节数，块大小不得小于它
pub const HEADER_SIZE: usize = 32;

/// inode 槽位或数据块的分配状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    #[default]
    Free = 0,
    InUse = 1,
}

/// 空闲表：每个 inode 槽位、每个数据块各占一个状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeList {
    pub inodes: Vec<Status>,
    pub blocks: Vec<Status>,
}

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录磁盘几何，据此定位其它区域；
/// - 持有空闲表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuperBlock {
    pub geometry: Geometry,
    pub free_list: FreeList,
}

impl Status {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Self::Free),
            1 => Ok(Self::InUse),
            _ => Err(Error::InvalidImage),
        }
    }
}

impl FreeList {
    pub fn new(num_inodes: usize, num_data_blocks: usize) -> Self {
        Self {
            inodes: vec![Status::Free; num_inodes],
            blocks: vec![Status::Free; num_data_blocks],
        }
    }

    pub fn free_inodes(&self) -> usize {
        Self::count_free(&self.inodes)
    }

    pub fn free_blocks(&self) -> usize {
        Self::count_free(&self.blocks)
    }

    /// 在用的 inode ID
    pub fn inodes_in_use(&self) -> impl Iterator<Item = u32> + '_ {
        self.inodes
            .iter()
            .enumerate()
            .filter(|(_, status)| **status == Status::InUse)
            .map(|(id, _)| id as u32)
    }

    /// 占用第一个空闲槽位并返回其编号；全部占用则返回空
    pub(crate) fn take_first(list: &mut [Status]) -> Option<u32> {
        let index = list.iter().position(|status| *status == Status::Free)?;
        list[index] = Status::InUse;
        Some(index as u32)
    }

    fn count_free(list: &[Status]) -> usize {
        list.iter().filter(|status| **status == Status::Free).count()
    }
}

impl SuperBlock {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            free_list: FreeList::new(geometry.num_inodes, geometry.num_data_blocks),
        }
    }

    /// 从超级块首部解析磁盘几何，不做合法性校验之外的检查
    pub fn read_geometry(bytes: &[u8]) -> Result<Geometry> {
        if bytes.len() < HEADER_SIZE || read_u32(bytes, 0) != MAGIC {
            return Err(Error::InvalidImage);
        }

        let field = |index: usize| read_u32(bytes, 4 + index * 4) as usize;
        let geometry = Geometry {
            block_size: field(0),
            num_inodes: field(1),
            num_data_blocks: field(2),
            direct_blocks: field(3),
            name_capacity: field(4),
        };
        geometry.validate().map_err(|_| Error::InvalidImage)?;

        Ok(geometry)
    }

    /// 解析整个超级块区域
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let geometry = Self::read_geometry(bytes)?;
        let inodes_end = HEADER_SIZE + geometry.num_inodes;
        let blocks_end = inodes_end + geometry.num_data_blocks;
        if bytes.len() < blocks_end {
            return Err(Error::InvalidImage);
        }

        let statuses = |range: core::ops::Range<usize>| {
            bytes[range]
                .iter()
                .map(|&byte| Status::from_byte(byte))
                .collect::<Result<Vec<_>>>()
        };

        Ok(Self {
            geometry,
            free_list: FreeList {
                inodes: statuses(HEADER_SIZE..inodes_end)?,
                blocks: statuses(inodes_end..blocks_end)?,
            },
        })
    }

    /// 编码为整个超级块区域的字节，长度为块大小的整数倍
    pub fn encode(&self) -> Vec<u8> {
        let geometry = &self.geometry;
        let mut bytes = vec![0; geometry.super_blocks() * geometry.block_size];

        write_u32(&mut bytes, 0, MAGIC);
        for (index, value) in [
            geometry.block_size,
            geometry.num_inodes,
            geometry.num_data_blocks,
            geometry.direct_blocks,
            geometry.name_capacity,
        ]
        .into_iter()
        .enumerate()
        {
            write_u32(&mut bytes, 4 + index * 4, value as u32);
        }

        let statuses = self.free_list.inodes.iter().chain(&self.free_list.blocks);
        for (byte, status) in bytes[HEADER_SIZE..].iter_mut().zip(statuses) {
            *byte = *status as u8;
        }

        bytes
    }
}
