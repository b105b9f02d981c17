//! # PROCAR 流式拆分器
//!
//! 对 PROCAR 做一次顺序读取，不把整个文件载入内存。每读完一条能带就产出一条
//! `BandRecord`，并可直接把按能带拆分的投影数据写入 `bandNN.dat`。
//!
//! 归一化与 `parsers/procar.rs` 使用同一函数 `BandWeights::normalize`，
//! 两种读取方式的结果逐位一致。
//!
//! ## 输出格式
//! ```text
//! <x>  <E - reference>  <c1 * marker>  <c2 * marker> ...
//! ```
//! 每条能带一个文件，按 k 点逐行写入。
//!
//! ## 依赖关系
//! - 被 `commands/split.rs` 使用
//! - 使用 `parsers/procar.rs` 的行解析函数
//! - 使用 `models/procar.rs`, `models/projection.rs`, `models/band.rs`
//! - 使用 `utils/progress.rs` 显示进度

use super::procar::{
    parse_band_energy, parse_error, parse_header_line, parse_ion_total, parse_tot_row,
};
use crate::error::{Result, VaspirinError};
use crate::models::procar::N_ORBITAL_CLASSES;
use crate::models::{BandStructure, BandWeights, ProcarHeader, ProjectionTable};
use crate::utils::progress;
use indicatif::ProgressBar;
use std::fs::{self, File};
use regex::Regex;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::iter::Peekable;
use std::path::{Path, PathBuf};

/// 单个 (k 点, 能带) 的流式读取结果
#[derive(Debug, Clone, PartialEq)]
pub struct BandRecord {
    /// 忽略前导 k 点后的 k 点索引（0 起始）
    pub kpoint: usize,
    /// 能带索引（0 起始）
    pub band: usize,
    /// PROCAR 中的能带能量 (eV)
    pub energy: f64,
    /// [s, px+py, pz, d]
    pub orbitals: [f64; N_ORBITAL_CLASSES],
    /// 每个离子的权重
    pub ions: Vec<f64>,
}

/// 逐条能带读取 PROCAR 的迭代器
pub struct ProcarStream<R: BufRead> {
    lines: Peekable<Lines<R>>,
    header: ProcarHeader,
    kpoints_ignored: usize,
    name: String,
    line_no: usize,
    kpoint: usize,
    band: usize,
    failed: bool,
}

impl ProcarStream<BufReader<File>> {
    /// 打开 PROCAR 文件
    pub fn open(path: &Path, kpoints_ignored: usize) -> Result<Self> {
        if !path.exists() {
            return Err(VaspirinError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let file = File::open(path).map_err(|e| VaspirinError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        ProcarStream::new(
            BufReader::new(file),
            kpoints_ignored,
            &path.display().to_string(),
        )
    }
}

impl<R: BufRead> ProcarStream<R> {
    /// 读取前两行文件头
    pub fn new(reader: R, kpoints_ignored: usize, name: &str) -> Result<Self> {
        let mut stream = ProcarStream {
            lines: reader.lines().peekable(),
            header: ProcarHeader {
                n_kpoints: 0,
                n_bands: 0,
                n_ions: 0,
            },
            kpoints_ignored,
            name: name.to_string(),
            line_no: 0,
            kpoint: 0,
            band: 0,
            failed: false,
        };

        stream.raw_line()?;
        let header_line = stream.raw_line()?;
        stream.header = parse_header_line(&header_line, name)?;
        Ok(stream)
    }

    pub fn header(&self) -> ProcarHeader {
        self.header
    }

    /// 保留的 k 点数
    pub fn n_kpoints(&self) -> usize {
        self.header.n_kpoints.saturating_sub(self.kpoints_ignored)
    }

    fn raw_line(&mut self) -> Result<String> {
        self.line_no += 1;
        match self.lines.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(VaspirinError::FileReadError {
                path: self.name.clone(),
                source: e,
            }),
            None => Err(parse_error(
                &self.name,
                format!("unexpected end of file at line {}", self.line_no),
            )),
        }
    }

    /// 下一个非空行，并检查其前缀
    fn expect_line(&mut self, prefix: &str) -> Result<String> {
        loop {
            let line = self.raw_line()?;
            if line.trim().is_empty() {
                continue;
            }
            if !line.trim_start().starts_with(prefix) {
                return Err(parse_error(
                    &self.name,
                    format!("expected '{}' at line {}", prefix, self.line_no),
                ));
            }
            return Ok(line);
        }
    }

    /// 跳过 `tot` 行之后到下一个 `band`/`k-point` 之前的内容
    /// （非共线计算的 mx/my/mz 表、相位表等）
    fn skip_to_next_band(&mut self) {
        while let Some(Ok(line)) = self.lines.peek() {
            let line = line.trim_start();
            if line.starts_with("band") || line.starts_with("k-point") {
                break;
            }
            self.lines.next();
            self.line_no += 1;
        }
    }

    fn read_band(&mut self) -> Result<(f64, BandWeights)> {
        if self.band == 0 {
            self.expect_line("k-point")?;
        }
        let band_line = self.expect_line("band")?;
        let energy = parse_band_energy(&band_line, &self.name)?;
        self.expect_line("ion")?;

        let mut ion_totals = Vec::with_capacity(self.header.n_ions);
        for _ in 0..self.header.n_ions {
            let line = self.expect_line("")?;
            ion_totals.push(parse_ion_total(&line, &self.name)?);
        }
        let tot_line = self.expect_line("tot")?;
        let tot_row = parse_tot_row(&tot_line, &self.name)?;
        self.skip_to_next_band();

        Ok((energy, BandWeights::normalize(&ion_totals, &tot_row)?))
    }
}

impl<R: BufRead> Iterator for ProcarStream<R> {
    type Item = Result<BandRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.kpoint >= self.header.n_kpoints || self.header.n_bands == 0 {
                return None;
            }

            let (kpoint, band) = (self.kpoint, self.band);
            let result = self.read_band();

            self.band += 1;
            if self.band == self.header.n_bands {
                self.band = 0;
                self.kpoint += 1;
            }

            match result {
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
                Ok(_) if kpoint < self.kpoints_ignored => continue,
                Ok((energy, weights)) => {
                    return Some(Ok(BandRecord {
                        kpoint: kpoint - self.kpoints_ignored,
                        band,
                        energy,
                        orbitals: weights.orbitals,
                        ions: weights.ions,
                    }))
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 按能带写盘
// ─────────────────────────────────────────────────────────────

/// 写出的权重种类
#[derive(Debug, Clone, Copy)]
pub enum SplitMode<'a> {
    /// 按 PROJECTION 汇总的材料权重
    Materials(&'a ProjectionTable),
    /// 轨道类别权重 [s, px+py, pz, d]
    Orbitals,
}

impl SplitMode<'_> {
    /// 默认输出目录名
    pub fn default_output_dir(&self) -> &'static str {
        match self {
            SplitMode::Materials(_) => "bands_projected",
            SplitMode::Orbitals => "bands_character",
        }
    }
}

/// 拆分选项
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// 忽略的前导 k 点数
    pub kpoints_ignored: usize,
    /// 权重缩放系数（绘图时的标记大小）
    pub marker: f64,
    /// 显示进度条
    pub show_progress: bool,
    /// 写入前删除并重建整个输出目录（仅用于程序自己命名的默认目录）
    pub recreate_output: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            kpoints_ignored: 0,
            marker: 0.5,
            show_progress: true,
            recreate_output: false,
        }
    }
}

/// 拆分结果统计
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub output_dir: PathBuf,
    pub n_kpoints: usize,
    pub n_bands: usize,
    pub files: Vec<PathBuf>,
}

/// 流式读取 PROCAR 并按能带写入 `output_dir/bandNN.dat`
///
/// 横轴与能量参考取自 `bands`。`recreate_output` 为 true 时整个输出目录被重建；
/// 否则只替换其中已有的 `bandNN.dat`，其他文件保持不变。
pub fn split_procar(
    procar: &Path,
    mode: SplitMode,
    bands: &BandStructure,
    output_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitSummary> {
    let stream = ProcarStream::open(procar, options.kpoints_ignored)?;
    split_stream(stream, mode, bands, output_dir, options)
}

/// 将任意 PROCAR 流按能带写盘
pub fn split_stream<R: BufRead>(
    stream: ProcarStream<R>,
    mode: SplitMode,
    bands: &BandStructure,
    output_dir: &Path,
    options: &SplitOptions,
) -> Result<SplitSummary> {
    let header = stream.header();
    if let SplitMode::Materials(projection) = mode {
        projection.check_ion_count(header.n_ions, "PROCAR")?;
    }

    let n_kpoints = stream.n_kpoints();
    if bands.x_axis.len() < n_kpoints {
        return Err(VaspirinError::InvalidData(format!(
            "PROCAR has {} k-points but OUTCAR path has {}",
            n_kpoints,
            bands.x_axis.len()
        )));
    }

    prepare_output_dir(output_dir, options.recreate_output)?;
    let files: Vec<PathBuf> = (1..=header.n_bands)
        .map(|b| output_dir.join(format!("band{:02}.dat", b)))
        .collect();
    let mut writers = files
        .iter()
        .map(|path| {
            File::create(path)
                .map(BufWriter::new)
                .map_err(|e| write_error(path, e))
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = if options.show_progress {
        progress::create_progress_bar(n_kpoints as u64, "Splitting PROCAR")
    } else {
        ProgressBar::hidden()
    };

    let reference = bands.reference();
    for record in stream {
        let record = record?;
        let values = match mode {
            SplitMode::Materials(projection) => projection.fold(&record.ions),
            SplitMode::Orbitals => record.orbitals.to_vec(),
        };
        let row = format_row(
            bands.x_axis[record.kpoint],
            record.energy - reference,
            &values,
            options.marker,
        );
        writers[record.band]
            .write_all(row.as_bytes())
            .map_err(|e| write_error(&files[record.band], e))?;

        if record.band + 1 == header.n_bands {
            pb.inc(1);
        }
    }

    for (writer, path) in writers.iter_mut().zip(&files) {
        writer.flush().map_err(|e| write_error(path, e))?;
    }
    pb.finish_and_clear();

    Ok(SplitSummary {
        output_dir: output_dir.to_path_buf(),
        n_kpoints,
        n_bands: header.n_bands,
        files,
    })
}

/// 单行输出：横轴、相对能量、按标记大小缩放的权重
fn format_row(x: f64, energy: f64, values: &[f64], marker: f64) -> String {
    // 非负能量前补一个空格，使正负值的数字列对齐
    let sign = if energy.is_sign_negative() { "" } else { " " };
    let mut row = format!("{:.6} {}{:.6}", x, sign, energy);
    for v in values {
        row.push_str(&format!(" {:.4}", v * marker));
    }
    row.push('\n');
    row
}

fn prepare_output_dir(dir: &Path, recreate: bool) -> Result<()> {
    if recreate && dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| write_error(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
    if !recreate {
        remove_band_files(dir)?;
    }
    Ok(())
}

/// 删除上一次拆分留下的 `bandNN.dat`
fn remove_band_files(dir: &Path) -> Result<()> {
    let band_file = Regex::new(r"^band\d{2,}\.dat$").unwrap();
    let entries = fs::read_dir(dir).map_err(|e| VaspirinError::FileReadError {
        path: dir.display().to_string(),
        source: e,
    })?;

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let is_band_file = path.is_file()
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| band_file.is_match(n));
        if is_band_file {
            fs::remove_file(&path).map_err(|e| write_error(&path, e))?;
        }
    }
    Ok(())
}

fn write_error(path: &Path, source: std::io::Error) -> VaspirinError {
    VaspirinError::FileWriteError {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::procar::{parse_procar_content, SAMPLE_PROCAR};
    use crate::parsers::projection::parse_projection_content;
    use std::io::Cursor;

    fn projection() -> ProjectionTable {
        parse_projection_content("A 1,3 red\nB 2 blue\n").unwrap()
    }

    fn stream(ignored: usize) -> ProcarStream<Cursor<&'static str>> {
        ProcarStream::new(Cursor::new(SAMPLE_PROCAR), ignored, "PROCAR").unwrap()
    }

    fn bands() -> BandStructure {
        BandStructure::new(
            vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            vec![vec![-5.0, 1.5], vec![-4.25, 0.75]],
            2,
            0.0,
            2.0,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_stream_header() {
        let s = stream(0);
        assert_eq!(s.header().n_kpoints, 2);
        assert_eq!(s.header().n_bands, 2);
        assert_eq!(s.header().n_ions, 3);
        assert_eq!(stream(1).n_kpoints(), 1);
    }

    #[test]
    fn test_stream_records() {
        let records: Vec<BandRecord> = stream(0).collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!((records[2].kpoint, records[2].band), (1, 0));
        assert_eq!(records[0].energy, -5.0);
        assert_eq!(records[3].energy, 0.75);
        assert_eq!(records[1].orbitals, [0.0; 4]);
        assert_eq!(records[1].ions, vec![0.0; 3]);
    }

    #[test]
    fn test_stream_matches_whole_file_reader() {
        let procar = parse_procar_content(SAMPLE_PROCAR, &projection(), 0, "PROCAR").unwrap();

        for record in stream(0) {
            let record = record.unwrap();
            let (k, b) = (record.kpoint, record.band);
            assert_eq!(record.orbitals, procar.orbital_contributions[k][b]);
            assert_eq!(record.ions, procar.ion_contributions[k][b]);
            assert_eq!(
                projection().fold(&record.ions),
                procar.material_contributions[k][b]
            );
        }
    }

    /// 在每个 `tot` 行后追加 mx/my/mz 三个无表头的离子表
    fn noncollinear(content: &str) -> String {
        let mut out = String::new();
        let mut ion_rows: Vec<&str> = Vec::new();
        let mut in_table = false;

        for line in content.lines() {
            out.push_str(line);
            out.push('\n');
            let trimmed = line.trim_start();
            if trimmed.starts_with("ion") {
                in_table = true;
                ion_rows.clear();
            } else if trimmed.starts_with("tot") {
                for _ in 0..3 {
                    for row in &ion_rows {
                        out.push_str(row);
                        out.push('\n');
                    }
                    out.push_str(line);
                    out.push('\n');
                }
                in_table = false;
            } else if in_table {
                ion_rows.push(line);
            }
        }
        out
    }

    #[test]
    fn test_noncollinear_stream_matches_whole_file_reader() {
        let content = noncollinear(SAMPLE_PROCAR);
        let procar = parse_procar_content(&content, &projection(), 0, "PROCAR").unwrap();

        let records: Vec<BandRecord> =
            ProcarStream::new(Cursor::new(content.as_str()), 0, "PROCAR")
                .unwrap()
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(records.len(), 4);
        for record in &records {
            let (k, b) = (record.kpoint, record.band);
            assert_eq!(record.orbitals, procar.orbital_contributions[k][b]);
            assert_eq!(record.ions, procar.ion_contributions[k][b]);
        }

        let collinear: Vec<BandRecord> = stream(0).collect::<Result<_>>().unwrap();
        assert_eq!(records, collinear);
    }

    #[test]
    fn test_noncollinear_skips_ignored_kpoints() {
        let content = noncollinear(SAMPLE_PROCAR);
        let records: Vec<BandRecord> =
            ProcarStream::new(Cursor::new(content.as_str()), 1, "PROCAR")
                .unwrap()
                .collect::<Result<_>>()
                .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].energy, 0.75);
    }

    #[test]
    fn test_stream_skips_ignored_kpoints() {
        let records: Vec<BandRecord> = stream(1).collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kpoint, 0);
        assert_eq!(records[0].energy, -4.25);
        assert!((records[0].ions[0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_stream_truncated() {
        let cut = SAMPLE_PROCAR.find(" k-point     2").unwrap();
        let s = ProcarStream::new(Cursor::new(&SAMPLE_PROCAR[..cut]), 0, "PROCAR").unwrap();
        let results: Vec<_> = s.collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok() && results[1].is_ok());
        assert!(matches!(results[2], Err(VaspirinError::ParseError { .. })));
    }

    #[test]
    fn test_format_row() {
        let row = format_row(0.5, -1.25, &[1.0, 0.2], 0.5);
        assert_eq!(row, "0.500000 -1.250000 0.5000 0.1000\n");

        // 非负能量前多一个空格
        assert_eq!(format_row(0.0, 1.5, &[], 1.0), "0.000000  1.500000\n");
        assert_eq!(format_row(1.0, -0.0, &[], 1.0), "1.000000 -0.000000\n");
    }

    #[test]
    fn test_split_materials_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let table = projection();
        let mode = SplitMode::Materials(&table);
        let out = dir.path().join(mode.default_output_dir());
        let options = SplitOptions {
            show_progress: false,
            ..SplitOptions::default()
        };
        let bands = bands();

        let summary = split_stream(stream(0), mode, &bands, &out, &options).unwrap();

        assert_eq!(summary.n_bands, 2);
        assert_eq!(summary.files[0], out.join("band01.dat"));
        let band1 = fs::read_to_string(out.join("band01.dat")).unwrap();
        let rows: Vec<Vec<f64>> = band1
            .lines()
            .map(|l| l.split_whitespace().map(|t| t.parse().unwrap()).collect())
            .collect();

        assert_eq!(rows.len(), 2);
        // 参考能量为 VBM = -4.25
        assert_eq!(rows[0][0], 0.0);
        assert!((rows[0][1] - -0.75).abs() < 1e-6);
        assert!((rows[0][2] - 0.25).abs() < 1e-6);
        assert!((rows[0][3] - 0.25).abs() < 1e-6);
        assert_eq!(rows[1][0], 1.0);
        assert!((rows[1][2] - 0.5).abs() < 1e-6);
        assert!(rows[1][3].abs() < 1e-6);
    }

    #[test]
    fn test_split_orbitals_recreates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join(SplitMode::Orbitals.default_output_dir());
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale.dat"), "old").unwrap();

        let options = SplitOptions {
            marker: 1.0,
            show_progress: false,
            recreate_output: true,
            ..SplitOptions::default()
        };
        split_stream(stream(0), SplitMode::Orbitals, &bands(), &out, &options).unwrap();

        assert!(!out.join("stale.dat").exists());
        let band2 = fs::read_to_string(out.join("band02.dat")).unwrap();
        let last: Vec<f64> = band2
            .lines()
            .nth(1)
            .unwrap()
            .split_whitespace()
            .map(|t| t.parse().unwrap())
            .collect();
        assert_eq!(last.len(), 2 + N_ORBITAL_CLASSES);
        assert!((last[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_split_keeps_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("work");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("OUTCAR"), "keep").unwrap();
        fs::write(out.join("band07.dat"), "stale").unwrap();

        let options = SplitOptions {
            show_progress: false,
            ..SplitOptions::default()
        };
        split_stream(stream(0), SplitMode::Orbitals, &bands(), &out, &options).unwrap();

        assert_eq!(fs::read_to_string(out.join("OUTCAR")).unwrap(), "keep");
        assert!(!out.join("band07.dat").exists());
        assert_eq!(
            fs::read_to_string(out.join("band01.dat")).unwrap().lines().count(),
            2
        );
    }

    #[test]
    fn test_split_rejects_projection_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let wrong = parse_projection_content("A 1..2\n").unwrap();
        let options = SplitOptions {
            show_progress: false,
            ..SplitOptions::default()
        };

        let result = split_stream(
            stream(0),
            SplitMode::Materials(&wrong),
            &bands(),
            dir.path(),
            &options,
        );
        assert!(matches!(result, Err(VaspirinError::ProjectionError(_))));
    }

    #[test]
    fn test_split_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProcarStream::open(&dir.path().join("PROCAR"), 0);
        assert!(matches!(result, Err(VaspirinError::FileNotFound { .. })));
    }
}
