//! # 能带结构数据模型
//!
//! 存储从 OUTCAR 提取的 k 点路径、倒格矢、本征值及派生量（价带顶、带隙、归一化横轴）。
//!
//! ## 依赖关系
//! - 被 `parsers/outcar.rs` 构造
//! - 被 `commands/bands.rs`, `commands/split.rs`, `export/` 使用
//! - 使用 `models/reference.rs`

use super::reference::Reference;
use crate::error::{Result, VaspirinError};
use serde::Serialize;

/// 能带结构
#[derive(Debug, Clone, Serialize)]
pub struct BandStructure {
    /// k 点路径（倒格子分数坐标），已去除被忽略的 k 点
    pub path: Vec<[f64; 3]>,

    /// 倒格矢 [b1, b2, b3]
    pub rec_lattice: [[f64; 3]; 3],

    /// 本征值 eigenvalues[kpoint][band] (eV)
    pub eigenvalues: Vec<Vec<f64>>,

    /// 能带数 (NBANDS)
    pub n_bands: usize,

    /// Fermi 能级 (eV)
    pub e_fermi: f64,

    /// 电子数 (NELECT)
    pub n_electrons: f64,

    /// 是否为自旋轨道耦合计算
    pub spin_orbit: bool,

    /// 价带顶 (eV)
    pub e_valence: f64,

    /// 归一化 k 点横轴，x[k] ∈ [0, 1]
    pub x_axis: Vec<f64>,

    /// 当前能量零点 (eV)
    reference: f64,
}

impl BandStructure {
    /// 由解析得到的原始数据构建能带结构，并计算价带顶和归一化横轴
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        path: Vec<[f64; 3]>,
        rec_lattice: [[f64; 3]; 3],
        eigenvalues: Vec<Vec<f64>>,
        n_bands: usize,
        e_fermi: f64,
        n_electrons: f64,
        spin_orbit: bool,
    ) -> Result<Self> {
        if eigenvalues.len() != path.len() {
            return Err(VaspirinError::InvalidData(format!(
                "{} k-points in path but {} eigenvalue blocks",
                path.len(),
                eigenvalues.len()
            )));
        }

        let mut bands = BandStructure {
            x_axis: normalized_axis(&path, &rec_lattice),
            path,
            rec_lattice,
            eigenvalues,
            n_bands,
            e_fermi,
            n_electrons,
            spin_orbit,
            e_valence: 0.0,
            reference: 0.0,
        };

        bands.e_valence = bands
            .valence_band()?
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max);
        bands.reference = bands.e_valence;

        Ok(bands)
    }

    /// k 点数
    pub fn n_kpoints(&self) -> usize {
        self.path.len()
    }

    /// 被占据的能带数：SOC 时为电子数，否则为电子数的一半
    pub fn n_valence(&self) -> usize {
        let n = self.n_electrons as usize;
        if self.spin_orbit {
            n
        } else {
            n / 2
        }
    }

    /// 每个 k 点上最高占据带的本征值
    pub fn valence_band(&self) -> Result<Vec<f64>> {
        let nval = self.n_valence();
        if nval == 0 {
            return Err(VaspirinError::InvalidData(format!(
                "no occupied band for NELECT = {}",
                self.n_electrons
            )));
        }
        self.band_column(nval - 1).ok_or_else(|| {
            VaspirinError::InvalidData(format!(
                "valence band {} is outside the eigenvalue table",
                nval
            ))
        })
    }

    /// 每个 k 点上最低非占据带的本征值；不存在时返回 `None`
    pub fn conduction_band(&self) -> Option<Vec<f64>> {
        self.band_column(self.n_valence())
    }

    fn band_column(&self, band: usize) -> Option<Vec<f64>> {
        if self.eigenvalues.is_empty() {
            return None;
        }
        self.eigenvalues
            .iter()
            .map(|kpt| kpt.get(band).copied())
            .collect()
    }

    /// 基本（间接）带隙: min(导带) - max(价带)
    pub fn gap(&self) -> Option<f64> {
        let conduction = self.conduction_band()?;
        let cbm = conduction.into_iter().fold(f64::INFINITY, f64::min);
        Some(cbm - self.e_valence)
    }

    /// 直接带隙: 同一 k 点上导带与价带之差的最小值
    pub fn direct_gap(&self) -> Option<f64> {
        let valence = self.valence_band().ok()?;
        let conduction = self.conduction_band()?;
        valence
            .iter()
            .zip(conduction.iter())
            .map(|(v, c)| c - v)
            .reduce(f64::min)
    }

    /// 当前能量零点
    pub fn reference(&self) -> f64 {
        self.reference
    }

    /// 设置数值能量零点
    pub fn set_reference(&mut self, reference: f64) {
        self.reference = reference;
    }

    /// 按名称设置能量零点，无法识别的名称回退到价带顶
    pub fn set_reference_name(&mut self, name: &str) {
        let reference = match Reference::from_name(name) {
            Some(Reference::Fermi) => self.e_fermi,
            Some(Reference::Value(v)) => v,
            Some(Reference::Vbm) | None => self.e_valence,
        };
        self.set_reference(reference);
    }

    /// 相对于能量零点的本征值
    pub fn shifted(&self, kpoint: usize, band: usize) -> Option<f64> {
        self.eigenvalues
            .get(kpoint)
            .and_then(|k| k.get(band))
            .map(|e| e - self.reference)
    }
}

/// 以倒格子度量计算 k 点路径的累计长度并归一化到 [0, 1]
///
/// 少于两个点或路径总长为零时返回全零。
pub fn normalized_axis(path: &[[f64; 3]], rec_lattice: &[[f64; 3]; 3]) -> Vec<f64> {
    let mut axis = Vec::with_capacity(path.len());
    let mut length = 0.0;

    for (k, point) in path.iter().enumerate() {
        if k > 0 {
            length += distance(rec_lattice, point, &path[k - 1]);
        }
        axis.push(length);
    }

    if length > 0.0 {
        for x in axis.iter_mut() {
            *x /= length;
        }
    }

    axis
}

/// 两个分数坐标点之间的笛卡尔距离
fn distance(basis: &[[f64; 3]; 3], p1: &[f64; 3], p2: &[f64; 3]) -> f64 {
    let d = [p1[0] - p2[0], p1[1] - p2[1], p1[2] - p2[2]];
    (0..3)
        .map(|j| (0..3).map(|i| d[i] * basis[i][j]).sum::<f64>())
        .map(|c| c * c)
        .sum::<f64>()
        .sqrt()
}
