//! # bands 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/bands.rs`

use clap::Args;
use std::path::PathBuf;

/// bands 子命令参数
#[derive(Args, Debug)]
pub struct BandsArgs {
    /// Path to the OUTCAR file
    #[arg(long, env = "VASPIRIN_OUTCAR", default_value = "OUTCAR")]
    pub outcar: PathBuf,

    /// Number of leading k-points to ignore (e.g. SCF mesh of a hybrid band run)
    #[arg(long, default_value_t = 0)]
    pub ignore: usize,

    /// Spin-orbit coupled calculation (one electron per band)
    #[arg(long, default_value_t = false)]
    pub soc: bool,

    /// Energy reference: vbm, efermi (e-fermi, ef) or a value in eV
    #[arg(long, default_value = "vbm", allow_hyphen_values = true)]
    pub reference: String,

    /// Write the shifted band table to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}
