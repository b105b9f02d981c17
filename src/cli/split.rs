//! # split 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/split.rs`

use clap::Args;
use std::path::PathBuf;

/// split 子命令参数
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Path to the OUTCAR file (k-path axis and energy reference)
    #[arg(long, env = "VASPIRIN_OUTCAR", default_value = "OUTCAR")]
    pub outcar: PathBuf,

    /// Path to the PROCAR file
    #[arg(long, env = "VASPIRIN_PROCAR", default_value = "PROCAR")]
    pub procar: PathBuf,

    /// PROJECTION file grouping ions into materials
    #[arg(long, env = "VASPIRIN_PROJECTION", default_value = "PROJECTION")]
    pub projection: PathBuf,

    /// Number of leading k-points to ignore
    #[arg(long, default_value_t = 0)]
    pub ignore: usize,

    /// Spin-orbit coupled calculation (one electron per band)
    #[arg(long, default_value_t = false)]
    pub soc: bool,

    /// Energy reference: vbm, efermi (e-fermi, ef) or a value in eV
    #[arg(long, default_value = "vbm", allow_hyphen_values = true)]
    pub reference: String,

    /// Scale factor applied to every weight (marker size)
    #[arg(long, default_value_t = 0.5)]
    pub marker: f64,

    /// Write orbital-class weights (s, px+py, pz, d) instead of material weights
    #[arg(long, default_value_t = false)]
    pub orbitals: bool,

    /// Output directory; existing bandNN.dat files in it are replaced, other files are kept
    /// (default: bands_projected or bands_character, recreated on every run)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
