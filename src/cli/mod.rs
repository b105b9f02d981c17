//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `bands`: OUTCAR 能带结构与带隙
//! - `dos`: DOSCAR 态密度，可按材料汇总
//! - `procar`: PROCAR 能带特征（整文件读取）
//! - `split`: PROCAR 流式拆分为逐能带数据文件
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: bands, dos, procar, split

pub mod bands;
pub mod dos;
pub mod procar;
pub mod split;

use clap::{Parser, Subcommand};

/// vaspirin - VASP 能带、态密度与投影后处理工具
#[derive(Parser)]
#[command(name = "vaspirin")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Band structure, DOS and PROCAR projection post-processing for VASP", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Read OUTCAR and report band edges, gaps and the energy reference
    Bands(bands::BandsArgs),

    /// Read DOSCAR and optionally sum the DOS per material
    Dos(dos::DosArgs),

    /// Read PROCAR and summarize the orbital and material character of each band
    Procar(procar::ProcarArgs),

    /// Stream PROCAR into one projected data file per band
    Split(split::SplitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_split_defaults() {
        let cli = Cli::try_parse_from(["vaspirin", "split", "--orbitals"]).unwrap();
        match cli.command {
            Commands::Split(args) => {
                assert!(args.orbitals);
                assert_eq!(args.marker, 0.5);
                assert_eq!(args.ignore, 0);
                assert_eq!(args.reference, "vbm");
            }
            _ => panic!("expected split"),
        }
    }

    #[test]
    fn test_parse_reference_number() {
        let cli = Cli::try_parse_from(["vaspirin", "bands", "--reference", "-1.5"]).unwrap();
        match cli.command {
            Commands::Bands(args) => assert_eq!(args.reference, "-1.5"),
            _ => panic!("expected bands"),
        }
    }
}
