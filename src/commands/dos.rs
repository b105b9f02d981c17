//! # dos 子命令实现
//!
//! 读取 DOSCAR，可选按 PROJECTION 把原子态密度汇总到材料，并打印摘要。
//!
//! ## 依赖关系
//! - 使用 `cli/dos.rs` 定义的参数
//! - 使用 `parsers/doscar.rs`, `parsers/projection.rs`, `export/`
//! - 使用 `utils/output.rs`

use super::{warn_reference, ReferenceTarget};
use crate::cli::dos::DosArgs;
use crate::error::Result;
use crate::export;
use crate::parsers::{doscar, projection};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 材料态密度表格行
#[derive(Debug, Clone, Tabled)]
struct MaterialRow {
    #[tabled(rename = "Material")]
    label: String,
    #[tabled(rename = "Ions")]
    n_ions: usize,
    #[tabled(rename = "Color")]
    color: String,
    #[tabled(rename = "States below ref")]
    occupied: String,
}

/// 执行 dos 命令
pub fn execute(args: DosArgs) -> Result<()> {
    output::print_header("Density of States");
    output::print_info(&format!("Reading '{}'...", args.doscar.display()));

    let mut dos = doscar::parse_doscar_file(&args.doscar)?;
    warn_reference(&args.reference, ReferenceTarget::Dos);
    dos.set_reference_name(&args.reference);

    let table = match args.projection {
        Some(ref path) => {
            output::print_info(&format!("Reading '{}'...", path.display()));
            let table = projection::parse_projection_file(path)?;
            dos.sum_contributions(&table)?;
            Some(table)
        }
        None => None,
    };

    output::print_kv("NEDOS", &dos.n_edos.to_string());
    output::print_kv("Atoms", &dos.n_atoms().to_string());
    output::print_kv("E-fermi (eV)", &format!("{:.4}", dos.e_fermi));
    output::print_kv("Reference (eV)", &format!("{:.4}", dos.reference()));
    if let (Some(first), Some(last)) = (dos.energies.first(), dos.energies.last()) {
        output::print_kv(
            "Energy range (eV)",
            &format!(
                "{:.4} .. {:.4}",
                first - dos.reference(),
                last - dos.reference()
            ),
        );
    }
    output::print_kv(
        "Total states below ref",
        &format!(
            "{:.4}",
            integrate_below(&dos.energies, &dos.states, dos.reference())
        ),
    );

    if let Some(ref table) = table {
        let groups = table.ion_groups();
        let rows: Vec<MaterialRow> = table
            .materials()
            .iter()
            .enumerate()
            .map(|(m, label)| MaterialRow {
                label: label.clone(),
                n_ions: groups[m].len(),
                color: table.color(m).unwrap_or("-").to_string(),
                occupied: format!(
                    "{:.4}",
                    integrate_below(&dos.energies, &dos.material_dos[m].total, dos.reference())
                ),
            })
            .collect();

        output::print_header("Material DOS");
        println!("{}", Table::new(&rows));
    } else if dos.n_atoms() == 0 {
        output::print_warning("DOSCAR contains no site-projected blocks");
    }

    if let Some(ref path) = args.csv {
        export::dos_to_csv(&dos, table.as_ref(), path)?;
        output::print_success(&format!("DOS table saved to '{}'", path.display()));
    }

    Ok(())
}

/// 梯形积分至能量零点（能量已按升序排列）
fn integrate_below(energies: &[f64], values: &[f64], reference: f64) -> f64 {
    energies
        .windows(2)
        .zip(values.windows(2))
        .take_while(|(e, _)| e[1] <= reference)
        .map(|(e, v)| 0.5 * (v[0] + v[1]) * (e[1] - e[0]))
        .sum()
}
