//! # PROCAR 投影权重数据模型
//!
//! 存储每个 k 点、每条能带的轨道类别权重、离子权重及其按材料汇总的结果。
//! 所有权重按该能带的总权重归一化；总权重为零时全部为零。
//!
//! ## 依赖关系
//! - 被 `parsers/procar.rs`, `parsers/splitter.rs` 使用
//! - 被 `commands/procar.rs`, `export/` 使用
//! - 使用 `models/projection.rs`

use super::projection::ProjectionTable;
use crate::error::{Result, VaspirinError};
use serde::Serialize;

/// 轨道类别数：s, p(x+y), pz, d
pub const N_ORBITAL_CLASSES: usize = 4;

/// 轨道类别名称，与 `BandWeights::orbitals` 顺序一致
pub const ORBITAL_CLASS_NAMES: [&str; N_ORBITAL_CLASSES] = ["s", "px+py", "pz", "d"];

/// PROCAR 第二行中的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcarHeader {
    pub n_kpoints: usize,
    pub n_bands: usize,
    pub n_ions: usize,
}

/// 单个 (k 点, 能带) 的归一化权重
#[derive(Debug, Clone, PartialEq)]
pub struct BandWeights {
    /// [s, px+py, pz, d] / tot
    pub orbitals: [f64; N_ORBITAL_CLASSES],
    /// 每个离子的 tot 列 / tot
    pub ions: Vec<f64>,
}

impl BandWeights {
    /// 由离子行的 tot 列和 `tot` 行归一化
    ///
    /// `tot_row` 为 `tot` 行去掉首个标签后的 10 个数：`s py pz px dxy dyz dz2 dxz dx2 tot`。
    pub fn normalize(ion_totals: &[f64], tot_row: &[f64]) -> Result<Self> {
        if tot_row.len() < 10 {
            return Err(VaspirinError::InvalidData(format!(
                "orbital total row has {} columns, expected 10",
                tot_row.len()
            )));
        }

        let total = tot_row[9];
        if total <= 0.0 {
            return Ok(BandWeights {
                orbitals: [0.0; N_ORBITAL_CLASSES],
                ions: vec![0.0; ion_totals.len()],
            });
        }

        let c: Vec<f64> = tot_row[..9].iter().map(|v| v / total).collect();
        Ok(BandWeights {
            orbitals: [c[0], c[1] + c[3], c[2], c[4] + c[5] + c[6] + c[7] + c[8]],
            ions: ion_totals.iter().map(|v| v / total).collect(),
        })
    }
}

/// PROCAR 中全部 k 点和能带的投影权重
#[derive(Debug, Clone, Serialize)]
pub struct Procar {
    /// 文件头中的计数
    pub header: ProcarHeader,

    /// 忽略的前导 k 点数
    pub kpoints_ignored: usize,

    /// orbital_contributions[kpoint][band] = [s, px+py, pz, d]
    pub orbital_contributions: Vec<Vec<[f64; N_ORBITAL_CLASSES]>>,

    /// ion_contributions[kpoint][band][ion]
    pub ion_contributions: Vec<Vec<Vec<f64>>>,

    /// material_contributions[kpoint][band][material]
    pub material_contributions: Vec<Vec<Vec<f64>>>,
}

impl Procar {
    /// 由逐能带权重构建，并按对照表汇总到材料
    pub fn new(
        header: ProcarHeader,
        kpoints_ignored: usize,
        weights: Vec<Vec<BandWeights>>,
        projection: &ProjectionTable,
    ) -> Result<Self> {
        projection.check_ion_count(header.n_ions, "PROCAR")?;

        let orbital_contributions = weights
            .iter()
            .map(|kpt| kpt.iter().map(|w| w.orbitals).collect())
            .collect();
        let material_contributions = weights
            .iter()
            .map(|kpt| kpt.iter().map(|w| projection.fold(&w.ions)).collect())
            .collect();
        let ion_contributions = weights
            .into_iter()
            .map(|kpt| kpt.into_iter().map(|w| w.ions).collect())
            .collect();

        Ok(Procar {
            header,
            kpoints_ignored,
            orbital_contributions,
            ion_contributions,
            material_contributions,
        })
    }

    /// 保留的 k 点数
    pub fn n_kpoints(&self) -> usize {
        self.orbital_contributions.len()
    }

    /// 每条能带在所有 k 点上的平均材料权重
    pub fn mean_material_weights(&self, band: usize) -> Vec<f64> {
        average(self.material_contributions.iter().map(|k| k[band].as_slice()))
    }

    /// 每条能带在所有 k 点上的平均轨道类别权重
    pub fn mean_orbital_weights(&self, band: usize) -> Vec<f64> {
        average(self.orbital_contributions.iter().map(|k| &k[band][..]))
    }
}

fn average<'a>(rows: impl Iterator<Item = &'a [f64]>) -> Vec<f64> {
    let mut sum: Vec<f64> = Vec::new();
    let mut count = 0usize;
    for row in rows {
        if sum.is_empty() {
            sum = vec![0.0; row.len()];
        }
        for (s, v) in sum.iter_mut().zip(row) {
            *s += v;
        }
        count += 1;
    }
    if count > 0 {
        for s in sum.iter_mut() {
            *s /= count as f64;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::projection::MaterialEntry;

    #[test]
    fn test_normalize_orbital_classes() {
        let tot = [0.1, 0.1, 0.2, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 1.0];
        let w = BandWeights::normalize(&[0.6, 0.4], &tot).unwrap();

        assert!((w.orbitals[0] - 0.1).abs() < 1e-12);
        assert!((w.orbitals[1] - 0.2).abs() < 1e-12);
        assert!((w.orbitals[2] - 0.2).abs() < 1e-12);
        assert!((w.orbitals[3] - 0.5).abs() < 1e-12);
        assert!((w.orbitals.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!((w.ions.iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_total() {
        let tot = [0.0; 10];
        let w = BandWeights::normalize(&[0.0, 0.0, 0.0], &tot).unwrap();

        assert_eq!(w.orbitals, [0.0; 4]);
        assert_eq!(w.ions, vec![0.0; 3]);
    }

    #[test]
    fn test_normalize_short_row() {
        assert!(BandWeights::normalize(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_material_aggregation() {
        let projection = ProjectionTable::from_entries(vec![
            MaterialEntry {
                label: "A".to_string(),
                ions: vec![1, 3],
                color: None,
            },
            MaterialEntry {
                label: "B".to_string(),
                ions: vec![2],
                color: None,
            },
        ])
        .unwrap();
        let header = ProcarHeader {
            n_kpoints: 1,
            n_bands: 1,
            n_ions: 3,
        };
        let weights = vec![vec![BandWeights {
            orbitals: [1.0, 0.0, 0.0, 0.0],
            ions: vec![0.2, 0.5, 0.3],
        }]];

        let procar = Procar::new(header, 0, weights, &projection).unwrap();

        assert!((procar.material_contributions[0][0][0] - 0.5).abs() < 1e-12);
        assert!((procar.material_contributions[0][0][1] - 0.5).abs() < 1e-12);
        assert_eq!(procar.mean_orbital_weights(0), vec![1.0, 0.0, 0.0, 0.0]);
    }
}
