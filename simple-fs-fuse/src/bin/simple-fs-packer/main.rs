mod cli;

use std::fs;
use std::io;
use std::io::Write;

use clap::Parser;
use cli::{Cli, Command};
use simple_fs_fuse::{format_image, mount_image, put_file, read_file};

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Command::Format(geometry) => {
            format_image(&cli.image, &cli.config(Some(geometry)))?;
        }

        Command::Pack { source, geometry } => {
            println!("source={source:?}\nimage={:?}", cli.image);
            let mut fs = format_image(&cli.image, &cli.config(Some(geometry)))?;

            let files = fs::read_dir(source)?
                .filter_map(|entry| {
                    entry
                        .and_then(|entry| Ok(entry.file_type()?.is_file().then(|| entry.path())))
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()?;

            for path in files {
                let name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or_else(|| {
                        io::Error::other(format!("{path:?}: file name is not UTF-8"))
                    })?;
                println!("file: {name:?}");
                put_file(&mut fs, name, &fs::read(&path)?)?;
            }
        }

        Command::Put { host, name } => {
            let mut fs = mount_image(&cli.image, &cli.config(None))?;
            let name = match name {
                Some(name) => name.as_str(),
                None => host
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or_else(|| io::Error::other("host file name is not UTF-8"))?,
            };
            put_file(&mut fs, name, &fs::read(host)?)?;
        }

        Command::Cat { name } => {
            let mut fs = mount_image(&cli.image, &cli.config(None))?;
            io::stdout().write_all(&read_file(&mut fs, name)?)?;
        }

        Command::Rm { name } => {
            let mut fs = mount_image(&cli.image, &cli.config(None))?;
            fs.stat(name).map_err(simple_fs_fuse::to_io_error)?;
            fs.delete(name);
        }

        Command::Ls => {
            let fs = mount_image(&cli.image, &cli.config(None))?;
            for stat in fs.list() {
                println!(
                    "{:>4} {:>8} {:>3} {}",
                    stat.inode, stat.size, stat.blocks, stat.name
                );
            }

            let usage = fs.usage();
            println!(
                "{}/{} inodes free, {}/{} blocks free",
                usage.free_inodes, usage.total_inodes, usage.free_blocks, usage.total_blocks
            );
        }
    }

    Ok(())
}
