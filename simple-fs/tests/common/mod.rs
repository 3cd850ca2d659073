#![allow(dead_code)]

use std::sync::Arc;

use block_dev::RamDisk;
use simple_fs::{Config, SimpleFileSystem};

pub fn ram_disk(config: &Config) -> Arc<RamDisk> {
    Arc::new(RamDisk::new(
        config.geometry.block_size,
        config.geometry.total_blocks(),
    ))
}

pub fn format(config: &Config) -> SimpleFileSystem {
    let _ = env_logger::builder().is_test(true).try_init();
    SimpleFileSystem::format(ram_disk(config), config).unwrap()
}

/// 新建并打开文件
pub fn open_new(fs: &mut SimpleFileSystem, name: &str) -> usize {
    fs.create(name).unwrap();
    fs.open(name).unwrap()
}

/// 用一个新句柄从头读出文件的至多 `len` 个字节
pub fn read_file(fs: &mut SimpleFileSystem, name: &str, len: usize) -> Vec<u8> {
    let fd = fs.open(name).unwrap();
    let mut buf = vec![0; len];
    let read_size = fs.read(fd, &mut buf).unwrap();
    fs.close(fd);

    buf.truncate(read_size);
    buf
}
