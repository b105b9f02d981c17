//! # procar 子命令实现
//!
//! 整文件读取 PROCAR，按 PROJECTION 汇总到材料，打印每条能带在所有 k 点上
//! 平均的轨道类别权重和主导材料。
//!
//! ## 依赖关系
//! - 使用 `cli/procar.rs` 定义的参数
//! - 使用 `parsers/procar.rs`, `parsers/projection.rs`, `export/`
//! - 使用 `utils/output.rs`

use crate::cli::procar::ProcarArgs;
use crate::error::Result;
use crate::export;
use crate::models::{Procar, ProjectionTable};
use crate::parsers::{procar, projection};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 能带特征表格行
#[derive(Debug, Clone, Tabled)]
struct CharacterRow {
    #[tabled(rename = "Band")]
    band: usize,
    #[tabled(rename = "s")]
    s: String,
    #[tabled(rename = "px+py")]
    pxy: String,
    #[tabled(rename = "pz")]
    pz: String,
    #[tabled(rename = "d")]
    d: String,
    #[tabled(rename = "Dominant material")]
    material: String,
}

/// 执行 procar 命令
pub fn execute(args: ProcarArgs) -> Result<()> {
    output::print_header("PROCAR Band Character");

    output::print_info(&format!("Reading '{}'...", args.projection.display()));
    let table = projection::parse_projection_file(&args.projection)?;

    output::print_info(&format!("Reading '{}'...", args.procar.display()));
    let procar = procar::parse_procar_file(&args.procar, &table, args.ignore)?;

    output::print_kv("k-points", &procar.header.n_kpoints.to_string());
    output::print_kv("Ignored k-points", &procar.kpoints_ignored.to_string());
    output::print_kv("Bands", &procar.header.n_bands.to_string());
    output::print_kv("Ions", &procar.header.n_ions.to_string());
    output::print_kv("Materials", &table.materials().join(", "));

    output::print_header("Mean Weights over k-points");
    println!("{}", Table::new(character_rows(&procar, &table)));

    if let Some(ref path) = args.csv {
        export::procar_to_csv(&procar, &table, path)?;
        output::print_success(&format!("Band character saved to '{}'", path.display()));
    }

    Ok(())
}

fn character_rows(procar: &Procar, table: &ProjectionTable) -> Vec<CharacterRow> {
    (0..procar.header.n_bands)
        .map(|band| {
            let orbitals = procar.mean_orbital_weights(band);
            let weight = |i: usize| format!("{:.3}", orbitals.get(i).copied().unwrap_or(0.0));
            CharacterRow {
                band: band + 1,
                s: weight(0),
                pxy: weight(1),
                pz: weight(2),
                d: weight(3),
                material: dominant(&procar.mean_material_weights(band), table),
            }
        })
        .collect()
}

/// 权重最大的材料及其权重；全部为零时返回 "-"
fn dominant(weights: &[f64], table: &ProjectionTable) -> String {
    weights
        .iter()
        .enumerate()
        .filter(|(_, w)| **w > 0.0)
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(m, w)| format!("{} ({:.2})", table.materials()[m], w))
        .unwrap_or_else(|| "-".to_string())
}
