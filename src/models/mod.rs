//! # 数据模型模块
//!
//! 定义能带结构、态密度、PROCAR 投影权重和原子分组的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`commands/` 和 `export/` 使用
//! - 子模块: band, dos, procar, projection, reference

pub mod band;
pub mod dos;
pub mod procar;
pub mod projection;
pub mod reference;

pub use band::BandStructure;
pub use dos::{AtomicDos, DosTable};
pub use procar::{BandWeights, Procar, ProcarHeader};
pub use projection::{MaterialEntry, ProjectionTable};
pub use reference::Reference;
