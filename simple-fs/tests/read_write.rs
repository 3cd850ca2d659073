mod common;

use simple_fs::{Config, Error};

#[test]
fn round_trip() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");

    fs.write(fd, b"hello").unwrap();
    assert_eq!(fs.seek(fd, -5), Ok(0));

    let mut buf = [0; 5];
    assert_eq!(fs.read(fd, &mut buf), Ok(5));
    assert_eq!(&buf, b"hello");
    assert_eq!(fs.tell(fd), Ok(5));
}

#[test]
fn short_read_on_empty_file() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");

    let mut buf = [0; 100];
    assert_eq!(fs.read(fd, &mut buf), Ok(0));
    assert_eq!(fs.tell(fd), Ok(0));
}

#[test]
fn empty_read_is_a_no_op() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");
    fs.write(fd, b"abc").unwrap();
    fs.seek(fd, -3).unwrap();

    assert_eq!(fs.read(fd, &mut []), Ok(0));
    assert_eq!(fs.tell(fd), Ok(0));
}

#[test]
fn read_stops_at_first_unallocated_block() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");
    fs.write(fd, b"hello").unwrap();

    // 0 号块已分配，其余部分为零；1 号块未分配即文件末尾
    let data = common::read_file(&mut fs, "a", 200);
    assert_eq!(data.len(), 64);
    assert_eq!(&data[..5], b"hello");
    assert!(data[5..].iter().all(|&byte| byte == 0));
}

#[test]
fn partial_block_merge() {
    let config = Config::default().with_block_size(512);
    let mut fs = common::format(&config);
    let fd = common::open_new(&mut fs, "a");

    fs.write(fd, b"0123456789").unwrap();
    fs.seek(fd, -8).unwrap();
    fs.write(fd, b"abcd").unwrap();
    assert_eq!(fs.tell(fd), Ok(6));

    fs.seek(fd, -6).unwrap();
    let mut buf = [0; 10];
    assert_eq!(fs.read(fd, &mut buf), Ok(10));
    assert_eq!(&buf, b"01abcd6789");
}

#[test]
fn write_across_blocks() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");
    let data: Vec<u8> = (0..150).map(|i| i as u8).collect();

    fs.write(fd, &data).unwrap();
    assert_eq!(fs.tell(fd), Ok(150));
    assert_eq!(fs.stat("a").unwrap().blocks, 3);

    // 跨越 0、1 号块边界的覆盖写
    fs.seek(fd, -90).unwrap();
    fs.write(fd, &[0xee; 10]).unwrap();

    let mut expected = data.clone();
    expected[60..70].fill(0xee);
    assert_eq!(common::read_file(&mut fs, "a", 150), expected);
    assert_eq!(fs.stat("a").unwrap().blocks, 3);
}

#[test]
fn file_size_grows_by_every_write() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");

    fs.write(fd, b"hello").unwrap();
    fs.seek(fd, -5).unwrap();
    fs.write(fd, b"HELLO").unwrap();

    assert_eq!(fs.stat("a").unwrap().size, 10);
    assert_eq!(common::read_file(&mut fs, "a", 5), b"HELLO");
}

#[test]
fn write_into_a_hole() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");

    // 跳过 0 号块，直接写 1 号块
    fs.seek(fd, 70).unwrap();
    fs.write(fd, b"xyz").unwrap();

    let inode = fs.inode(fs.stat("a").unwrap().inode).unwrap();
    assert_eq!(inode.block(0), None);
    assert!(inode.block(1).is_some());

    // 0 号块未分配，从头读即文件末尾
    assert!(common::read_file(&mut fs, "a", 10).is_empty());

    fs.seek(fd, -9).unwrap();
    let mut buf = [0xff; 8];
    assert_eq!(fs.read(fd, &mut buf), Ok(8));
    assert_eq!(&buf, b"\0\0\0\0\0\0xy");
}

#[test]
fn fill_file_to_the_ceiling() {
    let mut fs = common::format(&Config::default());
    let fd = common::open_new(&mut fs, "a");

    fs.write(fd, &[7; 256]).unwrap();
    assert_eq!(fs.tell(fd), Ok(256));

    // 偏移停在上限处：读不到数据，也写不进数据
    let mut buf = [0; 4];
    assert_eq!(fs.read(fd, &mut buf), Ok(0));
    assert_eq!(fs.write(fd, b"x"), Err(Error::FileTooLarge));
    assert_eq!(fs.write(fd, b""), Ok(()));

    assert_eq!(common::read_file(&mut fs, "a", 300), vec![7; 256]);
}

#[test]
fn handles_keep_their_own_offsets() {
    let mut fs = common::format(&Config::default());
    let writer = common::open_new(&mut fs, "a");
    let reader = fs.open("a").unwrap();
    assert_ne!(writer, reader);

    fs.write(writer, b"first").unwrap();
    fs.write(writer, b"second").unwrap();

    let mut buf = [0; 5];
    fs.read(reader, &mut buf).unwrap();
    assert_eq!(&buf, b"first");
    assert_eq!(fs.tell(reader), Ok(5));
    assert_eq!(fs.tell(writer), Ok(11));
}

#[test]
fn freed_blocks_come_back_zeroed() {
    let mut fs = common::format(&Config::default().with_data_blocks(1));
    let fd = common::open_new(&mut fs, "old");
    fs.write(fd, &[0xaa; 64]).unwrap();
    fs.delete("old");

    let fd = common::open_new(&mut fs, "new");
    fs.write(fd, b"hi").unwrap();

    let data = common::read_file(&mut fs, "new", 64);
    assert_eq!(&data[..2], b"hi");
    assert!(data[2..].iter().all(|&byte| byte == 0));
}
