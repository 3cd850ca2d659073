use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::BlockDevice;

/// 内存模拟的定长块设备，初始全零
#[derive(Debug)]
pub struct RamDisk {
    block_size: usize,
    num_blocks: usize,
    data: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new(block_size: usize, num_blocks: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");

        Self {
            block_size,
            num_blocks,
            data: Mutex::new(vec![0; block_size * num_blocks]),
        }
    }

    /// 块 `block_id` 在设备内存中的字节范围
    fn range(&self, block_id: usize, len: usize) -> core::ops::Range<usize> {
        assert!(block_id < self.num_blocks, "block {block_id} out of range");
        assert_eq!(len, self.block_size, "not a complete block!");

        let start = block_id * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let range = self.range(block_id, buf.len());
        buf.copy_from_slice(&self.data.lock()[range]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let range = self.range(block_id, buf.len());
        self.data.lock()[range].copy_from_slice(buf);
    }

    #[inline]
    fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}
