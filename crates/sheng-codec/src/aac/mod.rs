//! AAC 频谱重建核心.
//!
//! 每个声道元素每帧的处理流水线 (顺序由数据依赖决定, 不可调换):
//!
//! 1. Scalefactor 反量化 ([`spectral::dequant_scalefactors`])
//! 2. 立体声重建, 仅声道对 ([`spectral::apply_mid_side`] / [`spectral::apply_intensity_stereo`])
//! 3. TNS 滤波, 解码方向 ([`tns::apply_tns`])
//! 4. LTP 预测叠加 ([`ltp::apply_ltp`]); 帧合成后由 [`ltp::update_ltp_state`] 刷新历史
//!
//! 上游码流解析负责产出本模块消费的所有帧内参数并保证其结构合法;
//! 布局不变量在构造边界 ([`IcsInfo::new`] / [`build_band_runs`]) 做一次性校验,
//! 四个阶段本身不产生错误.

pub mod ltp;
pub mod mdct;
pub mod numeric;
pub mod spectral;
pub mod tns;


use log::debug;
use sheng_core::{ShengError, ShengResult};

use ltp::{LtpData, LtpState};
use mdct::WindowBank;
use numeric::Coef;
use tns::TnsData;

/// 长块 LTP 预测可作用的最大 scalefactor band 数.
pub const LTP_MAX_LONG_SFB: usize = 40;

/// 44100/48000Hz 下 1024 点 LONG 窗口的 SFB 边界 (49 个 band)
pub const SWB_OFFSET_1024_44100: [usize; 50] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 48, 56, 64, 72, 80, 88, 96, 108, 120, 132, 144, 160,
    176, 196, 216, 240, 264, 292, 320, 352, 384, 416, 448, 480, 512, 544, 576, 608, 640, 672, 704,
    736, 768, 800, 832, 864, 896, 928, 1024,
];

/// 44100/48000Hz 下 128 点 SHORT 窗口的 SFB 边界 (14 个 band)
pub const SWB_OFFSET_128_44100: [usize; 15] = [
    0, 4, 8, 12, 16, 20, 28, 36, 44, 56, 68, 80, 96, 112, 128,
];

/// 窗口序列类型 (ISO 14496-3, Table 4.46)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WindowSequence {
    OnlyLong,
    LongStart,
    EightShort,
    LongStop,
}

impl WindowSequence {
    pub fn is_eight_short(self) -> bool {
        matches!(self, WindowSequence::EightShort)
    }
}

/// 窗形: sine 或 Kaiser–Bessel Derived.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum WindowShape {
    #[default]
    Sine,
    Kbd,
}

/// 频带分类 (由上游 section 码本推导)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BandType {
    Zero,
    #[default]
    Normal,
    Intensity,
    IntensityAlt,
    Noise,
}

impl BandType {
    pub fn is_intensity(self) -> bool {
        matches!(self, BandType::Intensity | BandType::IntensityAlt)
    }
}

/// MS 立体声全局模式: 掩码全零 / 按频带传输 / 全一.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MsPresent {
    #[default]
    None,
    Mask,
    All,
}

/// 每帧的窗口/频带几何布局, 四个阶段共同消费.
#[derive(Clone, Debug)]
pub struct IcsInfo {
    pub window_sequence: WindowSequence,
    pub window_shape: WindowShape,
    pub prev_window_shape: WindowShape,
    pub max_sfb: usize,
    pub num_swb: usize,
    pub num_windows: usize,
    pub num_window_groups: usize,
    pub group_len: [usize; 8],
    pub group_start: [usize; 8],
    pub swb_offset: Vec<usize>,
    pub tns_max_bands: usize,
}

impl IcsInfo {
    /// 构建并校验频带布局.
    ///
    /// 校验 `swb_offset` 严格递增且首项为 0, `max_sfb ≤ num_swb`,
    /// 组长度与窗口数一致, 频带边界不超出窗口长度.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        window_sequence: WindowSequence,
        window_shape: WindowShape,
        prev_window_shape: WindowShape,
        max_sfb: usize,
        swb_offset: Vec<usize>,
        num_window_groups: usize,
        group_len: [usize; 8],
        tns_max_bands: usize,
    ) -> ShengResult<Self> {
        if swb_offset.len() < 2 {
            return Err(ShengError::InvalidArgument(format!(
                "AAC 频带布局非法: swb_offset 长度 {} 不足",
                swb_offset.len()
            )));
        }
        let num_swb = swb_offset.len() - 1;
        let window_len = if window_sequence.is_eight_short() {
            128
        } else {
            1024
        };
        if swb_offset[0] != 0 || *swb_offset.last().unwrap_or(&0) > window_len {
            return Err(ShengError::InvalidData(format!(
                "AAC 频带布局非法: swb_offset 边界超出窗口长度 {window_len}"
            )));
        }
        for i in 0..num_swb {
            if swb_offset[i] >= swb_offset[i + 1] {
                return Err(ShengError::InvalidData(format!(
                    "AAC 频带布局非法: swb_offset 非严格递增, i={i}"
                )));
            }
        }
        if max_sfb > num_swb {
            return Err(ShengError::InvalidData(format!(
                "AAC 频带布局非法: max_sfb={max_sfb} 超出 num_swb={num_swb}"
            )));
        }
        if tns_max_bands > num_swb {
            return Err(ShengError::InvalidData(format!(
                "AAC 频带布局非法: tns_max_bands={tns_max_bands} 超出 num_swb={num_swb}"
            )));
        }

        let num_windows = if window_sequence.is_eight_short() { 8 } else { 1 };
        if num_window_groups == 0 || num_window_groups > num_windows {
            return Err(ShengError::InvalidData(format!(
                "AAC 频带布局非法: 窗口组数 {num_window_groups} 与窗口数 {num_windows} 不符"
            )));
        }
        let mut group_start = [0usize; 8];
        let mut total = 0usize;
        for g in 0..num_window_groups {
            if group_len[g] == 0 {
                return Err(ShengError::InvalidData(format!(
                    "AAC 频带布局非法: 窗口组 {g} 长度为 0"
                )));
            }
            group_start[g] = total;
            total += group_len[g];
        }
        if total != num_windows {
            return Err(ShengError::InvalidData(format!(
                "AAC 频带布局非法: 组长度之和 {total} ≠ 窗口数 {num_windows}"
            )));
        }

        Ok(Self {
            window_sequence,
            window_shape,
            prev_window_shape,
            max_sfb,
            num_swb,
            num_windows,
            num_window_groups,
            group_len,
            group_start,
            swb_offset,
            tns_max_bands,
        })
    }

    /// 单长窗布局 (ONLY_LONG, sine 窗), 测试与简单调用方使用.
    pub fn only_long(max_sfb: usize, swb_offset: Vec<usize>) -> ShengResult<Self> {
        let tns_max_bands = swb_offset.len().saturating_sub(1);
        Self::new(
            WindowSequence::OnlyLong,
            WindowShape::Sine,
            WindowShape::Sine,
            max_sfb,
            swb_offset,
            1,
            [1, 0, 0, 0, 0, 0, 0, 0],
            tns_max_bands,
        )
    }

    /// 频带在单个窗口内的系数区间 [start, end).
    pub fn band_range(&self, sfb: usize) -> (usize, usize) {
        (self.swb_offset[sfb], self.swb_offset[sfb + 1])
    }
}

/// 同类型频带游程: 组内 [start, end) 的连续频带共享一种分类.
#[derive(Clone, Copy, Debug)]
pub struct BandRun {
    pub group: usize,
    pub start: usize,
    pub end: usize,
    pub band_type: BandType,
}

/// 由原始 band_type / run_end 数组编译游程表.
///
/// run_end 按组主序索引, 给出当前游程在组内的结束频带; 游程必须连续、
/// 穷尽覆盖 [0, max_sfb), 且游程内各频带的分类与 run_end 一致.
pub fn build_band_runs(
    band_types: &[BandType],
    run_ends: &[usize],
    num_window_groups: usize,
    max_sfb: usize,
) -> ShengResult<Vec<BandRun>> {
    let expected = num_window_groups * max_sfb;
    if band_types.len() != expected || run_ends.len() != expected {
        return Err(ShengError::InvalidArgument(format!(
            "AAC 频带游程非法: 期望 {expected} 个频带, 实际 band_type={}, run_end={}",
            band_types.len(),
            run_ends.len()
        )));
    }

    let mut runs = Vec::new();
    for g in 0..num_window_groups {
        let mut i = 0usize;
        while i < max_sfb {
            let idx = g * max_sfb + i;
            let end = run_ends[idx];
            if end <= i || end > max_sfb {
                return Err(ShengError::InvalidData(format!(
                    "AAC 频带游程非法: group={g}, sfb={i}, run_end={end}"
                )));
            }
            let band_type = band_types[idx];
            for sfb in i..end {
                let j = g * max_sfb + sfb;
                if band_types[j] != band_type || run_ends[j] != end {
                    return Err(ShengError::InvalidData(format!(
                        "AAC 频带游程非法: group={g}, sfb={sfb} 处游程不一致"
                    )));
                }
            }
            runs.push(BandRun {
                group: g,
                start: i,
                end,
                band_type,
            });
            i = end;
        }
    }
    Ok(runs)
}

/// 单声道元素: 一个声道在当前帧的全部频谱重建状态.
///
/// 帧内参数 (频带分类, sfo, TNS/LTP 参数) 每帧由上游重新装载;
/// `ltp_state` 跨帧存活, 与声道对象同生命周期.
pub struct SingleChannelElement<S: Coef> {
    pub band_types: Vec<BandType>,
    pub band_runs: Vec<BandRun>,
    pub sfo: Vec<i32>,
    pub sf: Vec<S>,
    /// 频谱系数, `num_windows * 128` 个, 按窗口分段寻址.
    pub coeffs: Vec<S>,
    pub tns: Option<TnsData<S>>,
    pub ltp: Option<LtpData<S>>,
    pub ltp_state: LtpState<S>,
}

impl<S: Coef> SingleChannelElement<S> {
    pub fn new() -> Self {
        Self {
            band_types: Vec::new(),
            band_runs: Vec::new(),
            sfo: Vec::new(),
            sf: Vec::new(),
            coeffs: vec![S::ZERO; 1024],
            tns: None,
            ltp: None,
            ltp_state: LtpState::new(),
        }
    }

    /// 装载本帧的频带分类与编码 scalefactor.
    pub fn set_band_info(
        &mut self,
        ics: &IcsInfo,
        band_types: &[BandType],
        run_ends: &[usize],
        sfo: &[i32],
    ) -> ShengResult<()> {
        if sfo.len() != band_types.len() {
            return Err(ShengError::InvalidArgument(format!(
                "AAC 频带数据非法: sfo 长度 {} 与频带数 {} 不符",
                sfo.len(),
                band_types.len()
            )));
        }
        self.band_runs = build_band_runs(band_types, run_ends, ics.num_window_groups, ics.max_sfb)?;
        self.band_types = band_types.to_vec();
        self.sfo = sfo.to_vec();
        self.sf.clear();
        self.sf.resize(band_types.len(), S::ZERO);
        Ok(())
    }
}

impl<S: Coef> Default for SingleChannelElement<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// 声道对元素 (CPE): 两个共享窗口布局的声道加立体声掩码.
pub struct ChannelPairElement<S: Coef> {
    pub ch: [SingleChannelElement<S>; 2],
    pub ms_present: MsPresent,
    pub ms_mask: Vec<bool>,
}

impl<S: Coef> ChannelPairElement<S> {
    pub fn new() -> Self {
        Self {
            ch: [SingleChannelElement::new(), SingleChannelElement::new()],
            ms_present: MsPresent::None,
            ms_mask: Vec::new(),
        }
    }

    /// 某频带的 MS 掩码位 (All 模式恒为真, None 恒为假).
    pub(crate) fn ms_used(&self, idx: usize) -> bool {
        match self.ms_present {
            MsPresent::None => false,
            MsPresent::All => true,
            MsPresent::Mask => self.ms_mask.get(idx).copied().unwrap_or(false),
        }
    }
}

impl<S: Coef> Default for ChannelPairElement<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// 重建单声道元素: 反量化 → TNS (解码方向) → LTP 叠加.
pub fn reconstruct_single<S: Coef>(
    sce: &mut SingleChannelElement<S>,
    ics: &IcsInfo,
    windows: &WindowBank<S>,
) {
    debug!(
        "AAC 重建 SCE: win={:?}, max_sfb={}, tns={}, ltp={}",
        ics.window_sequence,
        ics.max_sfb,
        sce.tns.is_some(),
        sce.ltp.is_some()
    );
    spectral::dequant_scalefactors(sce, ics);
    if let Some(tns) = &sce.tns {
        tns::apply_tns(&mut sce.coeffs, tns, ics, true);
    }
    if let Some(ltp) = &sce.ltp {
        ltp::apply_ltp(
            &mut sce.coeffs,
            sce.tns.as_ref(),
            ltp,
            &sce.ltp_state,
            ics,
            windows,
        );
    }
}

/// 重建声道对: 两声道反量化 → MS → IS → 各自 TNS → 各自 LTP.
pub fn reconstruct_pair<S: Coef>(
    cpe: &mut ChannelPairElement<S>,
    ics: &IcsInfo,
    windows: &WindowBank<S>,
) {
    debug!(
        "AAC 重建 CPE: win={:?}, max_sfb={}, ms={:?}",
        ics.window_sequence, ics.max_sfb, cpe.ms_present
    );
    for sce in cpe.ch.iter_mut() {
        spectral::dequant_scalefactors(sce, ics);
    }
    spectral::apply_mid_side(cpe, ics);
    spectral::apply_intensity_stereo(cpe, ics);
    for sce in cpe.ch.iter_mut() {
        if let Some(tns) = &sce.tns {
            tns::apply_tns(&mut sce.coeffs, tns, ics, true);
        }
        if let Some(ltp) = &sce.ltp {
            ltp::apply_ltp(
                &mut sce.coeffs,
                sce.tns.as_ref(),
                ltp,
                &sce.ltp_state,
                ics,
                windows,
            );
        }
    }
}
