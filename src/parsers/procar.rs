//! # VASP PROCAR 解析器（整文件读取）
//!
//! 将整个 PROCAR 读入内存，按 `k-point` 和 `band` 标记切块，提取每条能带的
//! 轨道类别权重和离子权重，并按 PROJECTION 汇总到材料。
//!
//! 超大文件请使用 `parsers/splitter.rs` 的流式读取。
//!
//! ## PROCAR 格式说明
//! ```text
//! PROCAR lm decomposed
//! # of k-points:  100         # of bands:   36         # of ions:    6
//!
//!  k-point     1 :    0.00000000 0.00000000 0.00000000     weight = 0.01000000
//!
//! band     1 # energy  -10.12345678 # occ.  2.00000000
//!
//! ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
//!     1  0.000  ...                                                     0.123
//! ...
//! tot    0.000  ...                                                     0.456
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/procar.rs` 使用
//! - 与 `parsers/splitter.rs` 共享行解析函数
//! - 使用 `models/procar.rs`, `models/projection.rs`

use super::read_input;
use crate::error::{Result, VaspirinError};
use crate::models::{BandWeights, Procar, ProcarHeader, ProjectionTable};
use std::path::Path;

/// 离子行和 `tot` 行的列数：序号/标签 + 9 个轨道 + tot
const ROW_COLUMNS: usize = 11;

/// 解析 PROCAR 文件
pub fn parse_procar_file(
    path: &Path,
    projection: &ProjectionTable,
    kpoints_ignored: usize,
) -> Result<Procar> {
    let content = read_input(path)?;
    parse_procar_content(
        &content,
        projection,
        kpoints_ignored,
        &path.display().to_string(),
    )
}

/// 从字符串内容解析 PROCAR
pub fn parse_procar_content(
    content: &str,
    projection: &ProjectionTable,
    kpoints_ignored: usize,
    name: &str,
) -> Result<Procar> {
    let header_line = content
        .lines()
        .nth(1)
        .ok_or_else(|| parse_error(name, "missing header line"))?;
    let header = parse_header_line(header_line, name)?;
    projection.check_ion_count(header.n_ions, "PROCAR")?;

    // 前两块分别是文件头和 "# of k-points" 的剩余部分
    let blocks: Vec<&str> = content.split("k-point").skip(2 + kpoints_ignored).collect();
    let expected = header.n_kpoints.saturating_sub(kpoints_ignored);
    if blocks.len() != expected {
        return Err(parse_error(
            name,
            format!("expected {} k-point blocks, found {}", expected, blocks.len()),
        ));
    }

    let weights = blocks
        .iter()
        .map(|block| parse_kpoint_block(block, &header, name))
        .collect::<Result<Vec<_>>>()?;

    Procar::new(header, kpoints_ignored, weights, projection)
}

fn parse_kpoint_block(block: &str, header: &ProcarHeader, name: &str) -> Result<Vec<BandWeights>> {
    let bands: Vec<&str> = block.split("band").collect();
    if bands.len() < header.n_bands + 1 {
        return Err(parse_error(
            name,
            format!(
                "k-point block has {} bands, expected {}",
                bands.len().saturating_sub(1),
                header.n_bands
            ),
        ));
    }

    bands[1..=header.n_bands]
        .iter()
        .map(|band| {
            let lines: Vec<&str> = band.split('\n').collect();
            let row = |i: usize| {
                lines
                    .get(i)
                    .copied()
                    .ok_or_else(|| parse_error(name, "band block ends early"))
            };

            let ion_totals = (0..header.n_ions)
                .map(|ion| parse_ion_total(row(3 + ion)?, name))
                .collect::<Result<Vec<_>>>()?;
            let tot_row = parse_tot_row(row(3 + header.n_ions)?, name)?;

            BandWeights::normalize(&ion_totals, &tot_row)
        })
        .collect()
}

pub(crate) fn parse_error(name: &str, reason: impl Into<String>) -> VaspirinError {
    VaspirinError::parse("PROCAR", name, reason)
}

/// 解析第二行 `# of k-points:  N  # of bands:  M  # of ions:  K`
pub(crate) fn parse_header_line(line: &str, name: &str) -> Result<ProcarHeader> {
    let fields: Vec<&str> = line.split(':').collect();
    let count = |i: usize| -> Result<usize> {
        fields
            .get(i)
            .and_then(|f| f.split_whitespace().next())
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| parse_error(name, format!("invalid header '{}'", line.trim())))
    };

    Ok(ProcarHeader {
        n_kpoints: count(1)?,
        n_bands: count(2)?,
        n_ions: count(3)?,
    })
}

/// 离子行的 tot 列
pub(crate) fn parse_ion_total(line: &str, name: &str) -> Result<f64> {
    let row = parse_row(line, name)?;
    Ok(row[ROW_COLUMNS - 1])
}

/// `tot` 行去掉标签后的 10 个数
pub(crate) fn parse_tot_row(line: &str, name: &str) -> Result<Vec<f64>> {
    let row = parse_row(line, name)?;
    Ok(row[1..].to_vec())
}

/// 能带行 `band 1 # energy  -10.1 # occ.  2.0` 中的能量
pub(crate) fn parse_band_energy(line: &str, name: &str) -> Result<f64> {
    line.split("energy")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| parse_error(name, format!("no energy in '{}'", line.trim())))
}

/// 解析 11 列的数据行，首列（序号或 `tot`）记为 0
fn parse_row(line: &str, name: &str) -> Result<Vec<f64>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < ROW_COLUMNS {
        return Err(parse_error(
            name,
            format!("expected {} columns in '{}'", ROW_COLUMNS, line.trim()),
        ));
    }

    let mut row = vec![0.0];
    for token in &tokens[1..ROW_COLUMNS] {
        row.push(
            token
                .parse()
                .map_err(|_| parse_error(name, format!("invalid number '{}'", token)))?,
        );
    }
    Ok(row)
}

/// 2 个 k 点 × 2 条能带 × 3 个离子的样例，k 点 1 的能带 2 权重全为零
#[cfg(test)]
pub(crate) const SAMPLE_PROCAR: &str = "PROCAR lm decomposed
# of k-points:    2         # of bands:    2         # of ions:    3

 k-point     1 :    0.00000000 0.00000000 0.00000000     weight = 0.50000000

band     1 # energy   -5.00000000 # occ.  2.00000000

ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
    1  0.100  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.100
    2  0.000  0.100  0.050  0.050  0.000  0.000  0.000  0.000  0.000  0.200
    3  0.000  0.000  0.000  0.000  0.100  0.000  0.000  0.000  0.000  0.100
tot    0.100  0.100  0.050  0.050  0.100  0.000  0.000  0.000  0.000  0.400

band     2 # energy    1.50000000 # occ.  0.00000000

ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
    1  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000
    2  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000
    3  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000
tot    0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000


 k-point     2 :    0.50000000 0.00000000 0.00000000     weight = 0.50000000

band     1 # energy   -4.25000000 # occ.  2.00000000

ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
    1  0.200  0.000  0.100  0.000  0.000  0.000  0.000  0.000  0.000  0.300
    2  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000
    3  0.000  0.000  0.000  0.000  0.000  0.100  0.000  0.000  0.000  0.100
tot    0.200  0.000  0.100  0.000  0.000  0.100  0.000  0.000  0.000  0.400

band     2 # energy    0.75000000 # occ.  0.00000000

ion      s     py     pz     px    dxy    dyz    dz2    dxz  x2-y2    tot
    1  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000  0.000
    2  0.000  0.200  0.200  0.200  0.000  0.000  0.000  0.000  0.000  0.600
    3  0.000  0.000  0.000  0.000  0.000  0.000  0.200  0.000  0.000  0.200
tot    0.000  0.200  0.200  0.200  0.000  0.000  0.200  0.000  0.000  0.800

";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::projection::parse_projection_content;
    use std::fs;

    fn projection() -> ProjectionTable {
        parse_projection_content("A 1,3 red\nB 2 blue\n").unwrap()
    }

    #[test]
    fn test_parse_header_line() {
        let header = parse_header_line(
            "# of k-points:  100         # of bands:   36         # of ions:    6",
            "PROCAR",
        )
        .unwrap();
        assert_eq!(
            header,
            ProcarHeader {
                n_kpoints: 100,
                n_bands: 36,
                n_ions: 6
            }
        );
        assert!(parse_header_line("# of k-points: many", "PROCAR").is_err());
    }

    #[test]
    fn test_parse_band_energy() {
        let e = parse_band_energy("band     1 # energy  -10.12345678 # occ.  2.00000000", "PROCAR");
        assert_eq!(e.unwrap(), -10.12345678);
        assert!(parse_band_energy("band 1", "PROCAR").is_err());
    }

    #[test]
    fn test_orbital_contributions() {
        let procar = parse_procar_content(SAMPLE_PROCAR, &projection(), 0, "PROCAR").unwrap();

        assert_eq!(procar.n_kpoints(), 2);
        let c = procar.orbital_contributions[0][0];
        assert!((c[0] - 0.25).abs() < 1e-12);
        assert!((c[1] - 0.375).abs() < 1e-12);
        assert!((c[2] - 0.125).abs() < 1e-12);
        assert!((c[3] - 0.25).abs() < 1e-12);

        let c = procar.orbital_contributions[1][1];
        assert!((c[1] - 0.5).abs() < 1e-12);
        assert!((c[3] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_weights_sum_to_one_or_zero() {
        let procar = parse_procar_content(SAMPLE_PROCAR, &projection(), 0, "PROCAR").unwrap();

        for k in 0..2 {
            for b in 0..2 {
                let orbitals: f64 = procar.orbital_contributions[k][b].iter().sum();
                let ions: f64 = procar.ion_contributions[k][b].iter().sum();
                if k == 0 && b == 1 {
                    assert!(procar.orbital_contributions[k][b].iter().all(|&v| v == 0.0));
                    assert!(procar.ion_contributions[k][b].iter().all(|&v| v == 0.0));
                } else {
                    assert!((orbitals - 1.0).abs() < 1e-6);
                    assert!((ions - 1.0).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_material_contributions() {
        let procar = parse_procar_content(SAMPLE_PROCAR, &projection(), 0, "PROCAR").unwrap();

        // A = 离子 1 + 3, B = 离子 2
        let m = &procar.material_contributions[0][0];
        assert!((m[0] - 0.5).abs() < 1e-12);
        assert!((m[1] - 0.5).abs() < 1e-12);

        let m = &procar.material_contributions[1][0];
        assert!((m[0] - 1.0).abs() < 1e-12);
        assert!(m[1].abs() < 1e-12);

        assert_eq!(procar.material_contributions[0][1], vec![0.0, 0.0]);
    }

    #[test]
    fn test_ignore_leading_kpoints() {
        let procar = parse_procar_content(SAMPLE_PROCAR, &projection(), 1, "PROCAR").unwrap();

        assert_eq!(procar.n_kpoints(), 1);
        assert!((procar.ion_contributions[0][0][0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_projection_mismatch_is_fatal() {
        let wrong = parse_projection_content("A 1..4\n").unwrap();
        let result = parse_procar_content(SAMPLE_PROCAR, &wrong, 0, "PROCAR");
        assert!(matches!(result, Err(VaspirinError::ProjectionError(_))));
    }

    #[test]
    fn test_truncated_file() {
        let cut = SAMPLE_PROCAR.find(" k-point     2").unwrap();
        let result = parse_procar_content(&SAMPLE_PROCAR[..cut], &projection(), 0, "PROCAR");
        assert!(matches!(result, Err(VaspirinError::ParseError { .. })));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PROCAR");
        fs::write(&path, SAMPLE_PROCAR).unwrap();

        let procar = parse_procar_file(&path, &projection(), 0).unwrap();
        assert_eq!(procar.header.n_ions, 3);
    }
}
