//! # procar 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/procar.rs`

use clap::Args;
use std::path::PathBuf;

/// procar 子命令参数
#[derive(Args, Debug)]
pub struct ProcarArgs {
    /// Path to the PROCAR file
    #[arg(long, env = "VASPIRIN_PROCAR", default_value = "PROCAR")]
    pub procar: PathBuf,

    /// PROJECTION file grouping ions into materials
    #[arg(long, env = "VASPIRIN_PROJECTION", default_value = "PROJECTION")]
    pub projection: PathBuf,

    /// Number of leading k-points to ignore
    #[arg(long, default_value_t = 0)]
    pub ignore: usize,

    /// Write the per-band character table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
