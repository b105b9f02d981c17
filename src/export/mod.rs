//! # CSV 数据导出
//!
//! 导出能带、态密度和 PROCAR 能带特征表到 CSV。所有能量均相对于当前能量零点。
//!
//! ## 支持格式
//! - 能带: `x, band, energy`，按能带、k 点顺序
//! - DOS: `energy, total, orbital_total, <材料...>`
//! - PROCAR: `band, s, px+py, pz, d, <材料...>`（k 点平均）
//!
//! ## 依赖关系
//! - 被 `commands/bands.rs`, `commands/dos.rs`, `commands/procar.rs` 调用
//! - 使用 `models/` 的数据结构
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::error::{Result, VaspirinError};
use crate::models::procar::ORBITAL_CLASS_NAMES;
use crate::models::{BandStructure, DosTable, Procar, ProjectionTable};

use serde::Serialize;
use std::path::Path;

/// 能带表中的一行
#[derive(Debug, Serialize)]
struct BandRow {
    x: f64,
    band: usize,
    energy: f64,
}

/// 导出能带为 CSV
pub fn bands_to_csv(bands: &BandStructure, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for band in 0..bands.n_bands {
        for (k, &x) in bands.x_axis.iter().enumerate() {
            if let Some(energy) = bands.shifted(k, band) {
                wtr.serialize(BandRow {
                    x,
                    band: band + 1,
                    energy,
                })?;
            }
        }
    }

    flush(wtr, output_path)
}

/// 导出态密度为 CSV；调用 `sum_contributions` 后包含每个材料的总态密度列
pub fn dos_to_csv(
    dos: &DosTable,
    projection: Option<&ProjectionTable>,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec![
        "energy".to_string(),
        "total".to_string(),
        "orbital_total".to_string(),
    ];
    if let Some(projection) = projection {
        header.extend(projection.materials().iter().cloned());
    }
    wtr.write_record(&header)?;

    for i in 0..dos.n_edos {
        let mut record = vec![
            format!("{:.6}", dos.energies[i] - dos.reference()),
            format!("{:.6}", dos.states[i]),
            dos.orbital_dos
                .total
                .get(i)
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default(),
        ];
        record.extend(dos.material_dos.iter().map(|m| {
            m.total
                .get(i)
                .map(|v| format!("{:.6}", v))
                .unwrap_or_default()
        }));
        wtr.write_record(&record)?;
    }

    flush(wtr, output_path)
}

/// 导出 PROCAR 能带特征（k 点平均的轨道类别与材料权重）
pub fn procar_to_csv(
    procar: &Procar,
    projection: &ProjectionTable,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    let mut header = vec!["band".to_string()];
    header.extend(ORBITAL_CLASS_NAMES.iter().map(|s| s.to_string()));
    header.extend(projection.materials().iter().cloned());
    wtr.write_record(&header)?;

    for band in 0..procar.header.n_bands {
        let mut record = vec![(band + 1).to_string()];
        record.extend(
            procar
                .mean_orbital_weights(band)
                .iter()
                .chain(procar.mean_material_weights(band).iter())
                .map(|v| format!("{:.6}", v)),
        );
        wtr.write_record(&record)?;
    }

    flush(wtr, output_path)
}

fn flush<W: std::io::Write>(mut wtr: csv::Writer<W>, output_path: &Path) -> Result<()> {
    wtr.flush().map_err(|e| VaspirinError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })
}
