mod common;

use simple_fs::layout::FreeList;
use simple_fs::store::{BlockStore, InodeStore};
use simple_fs::{Config, Disk, Error, Geometry, Inode, SimpleFileSystem};

/// 只允许再分配 `quota` 个数据块的存储
struct Quota {
    disk: Disk,
    quota: usize,
}

impl InodeStore for Quota {
    fn geometry(&self) -> Geometry {
        self.disk.geometry()
    }

    fn load_freelist(&self) -> FreeList {
        self.disk.load_freelist()
    }

    fn store_freelist(&mut self, free_list: &FreeList) {
        self.disk.store_freelist(free_list)
    }

    fn alloc_inode(&mut self) -> Option<u32> {
        self.disk.alloc_inode()
    }

    fn free_inode(&mut self, inode_id: u32) {
        self.disk.free_inode(inode_id)
    }

    fn load_inode(&self, inode_id: u32) -> Inode {
        self.disk.load_inode(inode_id)
    }

    fn store_inode(&mut self, inode_id: u32, inode: &Inode) {
        self.disk.store_inode(inode_id, inode)
    }
}

impl BlockStore for Quota {
    fn alloc_block(&mut self) -> Option<u32> {
        self.quota = self.quota.checked_sub(1)?;
        self.disk.alloc_block()
    }

    fn free_block(&mut self, block_id: u32) {
        self.quota += 1;
        self.disk.free_block(block_id)
    }

    fn load_block(&self, block_id: u32) -> Vec<u8> {
        self.disk.load_block(block_id)
    }

    fn store_block(&mut self, block_id: u32, data: &[u8]) {
        self.disk.store_block(block_id, data)
    }
}

#[test]
fn size_ceiling_leaves_file_untouched() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");
    let data: Vec<u8> = (0..200).map(|i| i as u8).collect();
    fs.write(fd, &data).unwrap();

    let inode_id = fs.stat("a").unwrap().inode;
    let before = fs.inode(inode_id).unwrap();
    let usage = fs.usage();

    // 200 + 100 字节需要 4 号块，而 K = 4
    assert_eq!(fs.write(fd, &[0xff; 100]), Err(Error::FileTooLarge));

    assert_eq!(fs.inode(inode_id), Some(before));
    assert_eq!(fs.usage(), usage);
    assert_eq!(fs.tell(fd), Ok(200));
    assert_eq!(common::read_file(&mut fs, "a", 200), data);
}

#[test]
fn rollback_when_blocks_run_out() {
    let config = Config::default();
    let disk = Disk::format(common::ram_disk(&config), config.geometry).unwrap();
    let mut fs = SimpleFileSystem::with_store(Quota { disk, quota: 3 }, &config).unwrap();

    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    fs.write(fd, &[1; 64]).unwrap();

    let inode_id = fs.stat("a").unwrap().inode;
    let before = fs.inode(inode_id).unwrap();
    let free_blocks = fs.usage().free_blocks;

    // 需要 3 个新块，只剩 2 个配额：分配到第 2 个之后失败
    assert_eq!(fs.write(fd, &[2; 192]), Err(Error::NoSpace));

    assert_eq!(fs.inode(inode_id), Some(before));
    assert_eq!(fs.usage().free_blocks, free_blocks);
    assert_eq!(fs.store().quota, 2);
    assert_eq!(fs.tell(fd), Ok(64));

    // 回收的块可以再次分配
    fs.write(fd, &[3; 128]).unwrap();
    assert_eq!(fs.stat("a").unwrap().blocks, 3);
}

#[test]
fn rollback_keeps_first_block_content() {
    // 3 个块给 filler，2 个块留给 a
    let config = Config::default().with_data_blocks(5);
    let mut fs = common::format(&config);

    let filler = common::open_new(&mut fs, "filler");
    fs.write(filler, &[9; 192]).unwrap();

    let fd = common::open_new(&mut fs, "a");
    let original: Vec<u8> = (0..64).map(|i| i as u8 + 100).collect();
    fs.write(fd, &original).unwrap();
    assert_eq!(fs.usage().free_blocks, 1);

    let inode_id = fs.stat("a").unwrap().inode;
    let before = fs.inode(inode_id).unwrap();

    // 从 0 号块中间开始写，覆盖 0 号块并需要 1~3 号块
    fs.seek(fd, -54).unwrap();
    assert_eq!(fs.write(fd, &[0xee; 200]), Err(Error::NoSpace));

    assert_eq!(fs.inode(inode_id), Some(before));
    assert_eq!(fs.usage().free_blocks, 1);
    assert_eq!(fs.tell(fd), Ok(10));
    assert_eq!(common::read_file(&mut fs, "a", 64), original);
    assert_eq!(common::read_file(&mut fs, "filler", 192), vec![9; 192]);
}

#[test]
fn failed_write_on_fresh_file_frees_everything() {
    let config = Config::default().with_data_blocks(2);
    let mut fs = common::format(&config);
    let fd = common::open_new(&mut fs, "a");

    assert_eq!(fs.write(fd, &[1; 150]), Err(Error::NoSpace));

    let stat = fs.stat("a").unwrap();
    assert_eq!((stat.size, stat.blocks), (0, 0));
    assert_eq!(fs.usage().free_blocks, 2);
    assert_eq!(fs.tell(fd), Ok(0));
}
