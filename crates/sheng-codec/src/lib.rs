//! # sheng-codec
//!
//! 笙框架 AAC 频谱重建库.
//!
//! 本 crate 实现 MPEG-4 AAC 解码器的频谱重建阶段: 把上游熵解码得到的
//! 量化频谱数据变换为可直接送入逆变换的完整重建频谱. 每个声道元素
//! 每帧依次经过四个阶段:
//!
//! 1. Scalefactor 反量化
//! 2. 立体声重建 (MS 和差 / 强度立体声)
//! 3. TNS 时域噪声整形滤波
//! 4. LTP 长时预测叠加与历史更新
//!
//! 码流解析、Huffman 解码与输出侧 IMDCT/overlap-add 属于外部协作者,
//! 不在本 crate 范围内.

pub mod aac;

// 重导出常用类型
pub use aac::numeric::Coef;
pub use aac::{
    BandRun, BandType, ChannelPairElement, IcsInfo, MsPresent, SingleChannelElement,
    WindowSequence, WindowShape,
};
