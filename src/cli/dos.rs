//! # dos 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/dos.rs`

use clap::Args;
use std::path::PathBuf;

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Path to the DOSCAR file
    #[arg(long, env = "VASPIRIN_DOSCAR", default_value = "DOSCAR")]
    pub doscar: PathBuf,

    /// PROJECTION file grouping ions into materials
    #[arg(long, env = "VASPIRIN_PROJECTION")]
    pub projection: Option<PathBuf>,

    /// Energy reference: efermi (e-fermi, ef) or a value in eV
    #[arg(long, default_value = "efermi", allow_hyphen_values = true)]
    pub reference: String,

    /// Write the DOS table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
