use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use simple_fs::{Config, Geometry, NamePolicy};

#[derive(Parser)]
pub struct Cli {
    /// Disk image
    #[arg(long, short)]
    pub image: PathBuf,

    /// Truncate over-long file names instead of rejecting them
    #[arg(long, global = true)]
    pub truncate_names: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty file system
    Format(GeometryArgs),

    /// Create a file system holding every regular file of a directory
    Pack {
        /// Source directory
        #[arg(long, short)]
        source: PathBuf,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Copy a host file into the image
    Put {
        host: PathBuf,

        /// Name inside the image, defaults to the host file name
        #[arg(long, short)]
        name: Option<String>,
    },

    /// Print a file to stdout
    Cat { name: String },

    /// Delete a file
    Rm { name: String },

    /// List files and free space
    Ls,
}

#[derive(Args)]
pub struct GeometryArgs {
    #[arg(long, default_value_t = Geometry::default().block_size)]
    pub block_size: usize,

    #[arg(long, default_value_t = Geometry::default().num_inodes)]
    pub inodes: usize,

    #[arg(long, default_value_t = Geometry::default().num_data_blocks)]
    pub data_blocks: usize,

    /// Direct blocks per file, i.e. the file size limit in blocks
    #[arg(long, default_value_t = Geometry::default().direct_blocks)]
    pub direct_blocks: usize,

    #[arg(long, default_value_t = Geometry::default().name_capacity)]
    pub name_capacity: usize,
}

impl Cli {
    /// 运行时选项；磁盘几何由 `geometry` 给出或从镜像读出
    pub fn config(&self, geometry: Option<&GeometryArgs>) -> Config {
        let name_policy = if self.truncate_names {
            NamePolicy::Truncate
        } else {
            NamePolicy::Reject
        };

        let config = Config::default().with_name_policy(name_policy);
        match geometry {
            Some(args) => config
                .with_block_size(args.block_size)
                .with_inodes(args.inodes)
                .with_data_blocks(args.data_blocks)
                .with_direct_blocks(args.direct_blocks)
                .with_name_capacity(args.name_capacity),
            None => config,
        }
    }
}
