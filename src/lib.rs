//! # Sheng (笙)
//!
//! 纯 Rust 实现的 MPEG-4 AAC 频谱重建核心.
//!
//! 笙实现 AAC 解码器中最精密的一段: 把熵解码后的量化频谱数据经
//! scalefactor 反量化、立体声重建、TNS 滤波与 LTP 长时预测, 变换为
//! 可直接送入逆变换的完整重建频谱. 浮点与定点两个数值域共享同一套
//! 控制流, 跨帧的 LTP 历史以精确的环形缓冲语义维护.
//!
//! # 快速开始
//!
//! ```rust
//! use sheng::codec::aac::{BandType, IcsInfo, SingleChannelElement, reconstruct_single};
//! use sheng::codec::aac::mdct::WindowBank;
//!
//! // 单长块, 1 个频带, 普通频谱编码
//! let ics = IcsInfo::only_long(1, vec![0, 128]).unwrap();
//! let windows = WindowBank::<f32>::new();
//! let mut sce = SingleChannelElement::<f32>::new();
//! sce.set_band_info(&ics, &[BandType::Normal], &[1], &[10]).unwrap();
//!
//! reconstruct_single(&mut sce, &ics, &windows);
//! assert!(sce.sf[0] < 0.0);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `sheng-core` | 错误类型与公共基础设施 |
//! | `sheng-codec` | AAC 频谱重建核心 |

/// 核心类型与工具
pub use sheng_core as core;

/// AAC 频谱重建
pub use sheng_codec as codec;

/// 获取笙版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
