//! # bands 子命令实现
//!
//! 读取 OUTCAR，报告 Fermi 能级、价带顶、导带底和带隙。
//!
//! ## 依赖关系
//! - 使用 `cli/bands.rs` 定义的参数
//! - 使用 `parsers/outcar.rs`, `export/`
//! - 使用 `utils/output.rs`

use super::{warn_reference, ReferenceTarget};
use crate::cli::bands::BandsArgs;
use crate::error::Result;
use crate::export;
use crate::models::BandStructure;
use crate::parsers::outcar::{self, OutcarOptions};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 带边表格行
#[derive(Debug, Clone, Tabled)]
struct EdgeRow {
    #[tabled(rename = "Edge")]
    edge: &'static str,
    #[tabled(rename = "k-point")]
    kpoint: usize,
    #[tabled(rename = "x")]
    x: String,
    #[tabled(rename = "E (eV)")]
    energy: String,
    #[tabled(rename = "E - ref (eV)")]
    shifted: String,
}

/// 执行 bands 命令
pub fn execute(args: BandsArgs) -> Result<()> {
    output::print_header("Band Structure");
    output::print_info(&format!("Reading '{}'...", args.outcar.display()));

    let options = OutcarOptions {
        kpoints_ignored: args.ignore,
        spin_orbit: args.soc,
    };
    let mut bands = outcar::parse_outcar_file(&args.outcar, &options)?;

    warn_reference(&args.reference, ReferenceTarget::Bands);
    bands.set_reference_name(&args.reference);

    output::print_kv("k-points", &bands.n_kpoints().to_string());
    output::print_kv("NBANDS", &bands.n_bands.to_string());
    output::print_kv("NELECT", &format!("{}", bands.n_electrons));
    output::print_kv("Spin-orbit", &bands.spin_orbit.to_string());
    output::print_kv("E-fermi (eV)", &format!("{:.4}", bands.e_fermi));
    output::print_kv("VBM (eV)", &format!("{:.4}", bands.e_valence));
    output::print_kv("Gap (eV)", &format_gap(bands.gap()));
    output::print_kv("Direct gap (eV)", &format_gap(bands.direct_gap()));
    output::print_kv("Reference (eV)", &format!("{:.4}", bands.reference()));
    println!();

    let rows = edge_rows(&bands)?;
    println!("{}", Table::new(&rows));

    if let Some(ref path) = args.csv {
        export::bands_to_csv(&bands, path)?;
        output::print_success(&format!("Band table saved to '{}'", path.display()));
    }

    Ok(())
}

fn format_gap(gap: Option<f64>) -> String {
    gap.map(|g| format!("{:.4}", g))
        .unwrap_or_else(|| "n/a".to_string())
}

/// 价带顶与导带底所在的 k 点
fn edge_rows(bands: &BandStructure) -> Result<Vec<EdgeRow>> {
    let mut rows = Vec::new();
    rows.extend(edge_row(bands, "VBM", &bands.valence_band()?, |a, b| a > b));
    if let Some(conduction) = bands.conduction_band() {
        rows.extend(edge_row(bands, "CBM", &conduction, |a, b| a < b));
    }
    Ok(rows)
}

fn edge_row(
    bands: &BandStructure,
    edge: &'static str,
    column: &[f64],
    better: fn(f64, f64) -> bool,
) -> Option<EdgeRow> {
    let (k, energy) = column
        .iter()
        .copied()
        .enumerate()
        .reduce(|best, cur| if better(cur.1, best.1) { cur } else { best })?;

    Some(EdgeRow {
        edge,
        kpoint: k + 1,
        x: format!("{:.4}", bands.x_axis.get(k).copied().unwrap_or(0.0)),
        energy: format!("{:.4}", energy),
        shifted: format!("{:.4}", energy - bands.reference()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> BandStructure {
        BandStructure::new(
            vec![[0.0, 0.0, 0.0], [0.25, 0.0, 0.0], [0.5, 0.0, 0.0]],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![vec![-2.0, 1.0], vec![-1.0, 0.5], vec![-1.5, 0.8]],
            2,
            0.0,
            2.0,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_edge_rows() {
        let rows = edge_rows(&bands()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].edge, "VBM");
        assert_eq!(rows[0].kpoint, 2);
        assert_eq!(rows[0].x, "0.5000");
        assert_eq!(rows[0].shifted, "0.0000");
        assert_eq!(rows[1].edge, "CBM");
        assert_eq!(rows[1].kpoint, 2);
        assert_eq!(rows[1].energy, "0.5000");
    }

    #[test]
    fn test_format_gap() {
        assert_eq!(format_gap(Some(1.23456)), "1.2346");
        assert_eq!(format_gap(None), "n/a");
    }
}
