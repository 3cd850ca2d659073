
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use block_dev::BlockDevice;
use simple_fs::layout::HEADER_SIZE;
use simple_fs::store::InodeStore;
use simple_fs::{Config, Error, SimpleFileSystem};

/// 以宿主文件模拟的块设备
#[derive(Debug)]
pub struct BlockFile {
    inner: Mutex<File>,
    block_size: usize,
    num_blocks: usize,
}

impl BlockFile {
    pub fn new(fd: File, block_size: usize, num_blocks: usize) -> Self {
        Self {
            inner: Mutex::new(fd),
            block_size,
            num_blocks,
        }
    }

    /// 新建或清空镜像文件，使其恰好容纳 `num_blocks` 块
    pub fn create(path: &Path, block_size: usize, num_blocks: usize) -> io::Result<Self> {
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        fd.set_len((block_size * num_blocks) as u64)?;

        Ok(Self::new(fd, block_size, num_blocks))
    }

    /// 打开已有镜像，块大小从超级块中读出
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut fd = OpenOptions::new().read(true).write(true).open(path)?;

        let mut header = [0; HEADER_SIZE];
        fd.read_exact(&mut header)?;
        let block_size = simple_fs::probe_block_size(&header).map_err(to_io_error)?;
        let num_blocks = (fd.metadata()?.len() / block_size as u64) as usize;
        log::debug!("{path:?}: {num_blocks} blocks of {block_size} bytes");

        Ok(Self::new(fd, block_size, num_blocks))
    }
}

impl BlockDevice for BlockFile {
    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.inner.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * self.block_size) as u64))
            .expect("seeking error");
        file.read_exact(buf).expect("not a complete block!");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.inner.lock().unwrap();
        file.seek(SeekFrom::Start((block_id * self.block_size) as u64))
            .expect("seeking error");
        file.write_all(buf).expect("not a complete block!");
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }
}

/// 在 `path` 上新建镜像并格式化
pub fn format_image(path: &Path, config: &Config) -> io::Result<SimpleFileSystem> {
    config.validate().map_err(to_io_error)?;
    let geometry = &config.geometry;
    let block_file = BlockFile::create(path, geometry.block_size, geometry.total_blocks())?;

    SimpleFileSystem::format(Arc::new(block_file), config).map_err(to_io_error)
}

pub fn mount_image(path: &Path, config: &Config) -> io::Result<SimpleFileSystem> {
    let block_file = BlockFile::open(path)?;
    SimpleFileSystem::mount(Arc::new(block_file), config).map_err(to_io_error)
}

/// 写入整个文件，同名文件会被替换；失败时旧文件保持原样
pub fn put_file(fs: &mut SimpleFileSystem, name: &str, data: &[u8]) -> io::Result<()> {
    let geometry = fs.store().geometry();
    if data.len() > geometry.max_file_size() {
        return Err(to_io_error(Error::FileTooLarge));
    }

    // 旧文件的块在替换时会先被回收
    let old = fs.stat(name).ok();
    let reclaimable = old.as_ref().map_or(0, |stat| stat.blocks);
    if fs.usage().free_blocks + reclaimable < data.len().div_ceil(geometry.block_size) {
        return Err(to_io_error(Error::NoSpace));
    }

    if let Some(old) = old {
        log::info!("replace {name:?}: {} bytes -> {} bytes", old.size, data.len());
        fs.delete(name);
    }
    fs.create(name).map_err(to_io_error)?;

    let fd = fs.open(name).map_err(to_io_error)?;
    let result = fs.write(fd, data);
    fs.close(fd);

    if let Err(err) = result {
        // 不留下空壳文件
        log::warn!("put {name:?} failed: {err}");
        fs.delete(name);
        return Err(to_io_error(err));
    }
    Ok(())
}

/// 读出整个文件
pub fn read_file(fs: &mut SimpleFileSystem, name: &str) -> io::Result<Vec<u8>> {
    let stat = fs.stat(name).map_err(to_io_error)?;
    let fd = fs.open(name).map_err(to_io_error)?;

    let mut data = vec![0; fs.store().geometry().max_file_size()];
    let result = fs.read(fd, &mut data);
    fs.close(fd);

    // 最后一块中大小之外的部分不属于文件内容
    let len = result.map_err(to_io_error)?.min(stat.size as usize);
    data.truncate(len);
    Ok(data)
}

pub fn to_io_error(err: simple_fs::Error) -> io::Error {
    use simple_fs::Error::*;

    let kind = match err {
        NotFound => io::ErrorKind::NotFound,
        NameCollision => io::ErrorKind::AlreadyExists,
        NoSpace => io::ErrorKind::StorageFull,
        FileTooLarge => io::ErrorKind::FileTooLarge,
        InvalidImage => io::ErrorKind::InvalidData,
        NameTooLong | InvalidName | InvalidConfig | InvalidHandle | OutOfRange => {
            io::ErrorKind::InvalidInput
        }
        TooManyOpenFiles => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
