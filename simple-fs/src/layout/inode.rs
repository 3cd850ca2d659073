//! 磁盘上的 inode：
//!
//! ```text
//! name[name_capacity] | status u8 | pad | file_size u32 | direct[K] u32
//! ```
//!
//! 文件名以 `\0` 填充，恰好填满容量时没有结尾的 `\0`。
//! 直接索引块以 `u32::MAX` 表示未分配。

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use super::{Status, read_u32, write_u32};
use crate::Geometry;

const UNALLOCATED: u32 = u32::MAX;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inode {
    pub name: String,
    pub status: Status,
    /// 直接索引块，恰好 K 项；`None` 表示尚未分配
    pub direct_blocks: Vec<Option<u32>>,
    /// 逻辑上写入过的字节数
    pub file_size: u32,
}

impl Inode {
    /// 新建的在用 inode：没有数据块，大小为 0
    pub fn new(name: &str, direct_blocks: usize) -> Self {
        Self {
            name: name.into(),
            status: Status::InUse,
            direct_blocks: vec![None; direct_blocks],
            file_size: 0,
        }
    }

    /// 空闲槽位上的 inode
    pub fn empty(direct_blocks: usize) -> Self {
        Self {
            direct_blocks: vec![None; direct_blocks],
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_in_use(&self) -> bool {
        self.status == Status::InUse
    }

    /// 第 `block_index` 个数据块的编号，越界或未分配时返回空
    #[inline]
    pub fn block(&self, block_index: usize) -> Option<u32> {
        self.direct_blocks.get(block_index).copied().flatten()
    }

    /// 已分配的数据块
    pub fn allocated_blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.direct_blocks.iter().flatten().copied()
    }

    pub fn decode(geometry: &Geometry, bytes: &[u8]) -> Self {
        let name_field = &bytes[..geometry.name_capacity];
        let name_len = name_field
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(name_field.len());
        let name = String::from_utf8_lossy(&name_field[..name_len]).into_owned();

        let status = match bytes[geometry.name_capacity] {
            1 => Status::InUse,
            _ => Status::Free,
        };

        let size_offset = geometry.file_size_offset();
        let file_size = read_u32(bytes, size_offset);
        let direct_blocks = (0..geometry.direct_blocks)
            .map(|index| match read_u32(bytes, size_offset + 4 + index * 4) {
                UNALLOCATED => None,
                block_id => Some(block_id),
            })
            .collect();

        Self {
            name,
            status,
            direct_blocks,
            file_size,
        }
    }

    /// 编码进 `bytes`，长度至少为 [`Geometry::inode_size`]
    pub fn encode(&self, geometry: &Geometry, bytes: &mut [u8]) {
        let bytes = &mut bytes[..geometry.inode_size()];
        bytes.fill(0);

        let name = self.name.as_bytes();
        assert!(name.len() <= geometry.name_capacity, "name exceeds its field");
        bytes[..name.len()].copy_from_slice(name);
        bytes[geometry.name_capacity] = self.status as u8;

        let size_offset = geometry.file_size_offset();
        write_u32(bytes, size_offset, self.file_size);
        for index in 0..geometry.direct_blocks {
            let block_id = self.block(index).unwrap_or(UNALLOCATED);
            write_u32(bytes, size_offset + 4 + index * 4, block_id);
        }
    }
}
