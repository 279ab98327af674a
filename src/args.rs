use std::path::PathBuf;

use clap::Parser;

/// Command line configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "2222")]
    pub port: u16,

    /// Username for password authentication
    #[arg(long, default_value = "sftp")]
    pub username: String,

    /// Password for password authentication
    #[arg(long, default_value = "getTheFiles")]
    pub password: String,

    /// Root directory all SFTP paths are confined to
    #[arg(long, default_value = "./sftp_data")]
    pub root_dir: PathBuf,

    /// Maximum size of a single READ response (in bytes)
    #[arg(long, default_value = "32768")]
    pub max_read_size: u32,
}
