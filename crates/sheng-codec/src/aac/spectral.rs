//! 频谱处理: scalefactor 反量化与立体声重建.
//!
//! MS 和差参照 ISO 14496-3, 4.6.8.1.3; 强度立体声参照 4.6.8.2.

use super::numeric::Coef;
use super::{BandType, ChannelPairElement, IcsInfo, MsPresent, SingleChannelElement};

/// 将编码整数 scalefactor 映射为当前数值域的幅值/符号值.
///
/// 按游程表组主序线性扫描一遍, 只写 `sf[]`. 越界的 sfo 原样接受
/// (取值由上游已验证的解码步骤保证).
pub fn dequant_scalefactors<S: Coef>(sce: &mut SingleChannelElement<S>, ics: &IcsInfo) {
    sce.sf.clear();
    sce.sf.resize(ics.num_window_groups * ics.max_sfb, S::ZERO);

    for run in &sce.band_runs {
        for sfb in run.start..run.end {
            let idx = run.group * ics.max_sfb + sfb;
            sce.sf[idx] = match run.band_type {
                BandType::Zero => S::ZERO,
                BandType::Intensity | BandType::IntensityAlt => {
                    S::dequant_intensity(sce.sfo[idx])
                }
                BandType::Noise => S::dequant_noise(sce.sfo[idx]),
                BandType::Normal => S::dequant_normal(sce.sfo[idx]),
            };
        }
    }
}

/// 对声道对频谱应用 MS 和差反变换.
///
/// 掩码置位且两声道均非噪声频带时, 把 (l, r) 替换为 (l+r, l−r);
/// 噪声频带存储的是能量而非带符号幅值, 永不参与和差.
pub fn apply_mid_side<S: Coef>(cpe: &mut ChannelPairElement<S>, ics: &IcsInfo) {
    if cpe.ms_present == MsPresent::None {
        return;
    }
    for g in 0..ics.num_window_groups {
        for sfb in 0..ics.max_sfb {
            let idx = g * ics.max_sfb + sfb;
            if !cpe.ms_used(idx) {
                continue;
            }
            let bt0 = cpe.ch[0].band_types.get(idx).copied().unwrap_or_default();
            let bt1 = cpe.ch[1].band_types.get(idx).copied().unwrap_or_default();
            if bt0 == BandType::Noise || bt1 == BandType::Noise {
                continue;
            }
            let (start, end) = ics.band_range(sfb);
            let [ch0, ch1] = &mut cpe.ch;
            for win in 0..ics.group_len[g] {
                let base = (ics.group_start[g] + win) * 128;
                S::butterflies(
                    &mut ch0.coeffs[base + start..base + end],
                    &mut ch1.coeffs[base + start..base + end],
                );
            }
        }
    }
}

/// 对声道对频谱应用强度立体声重建.
///
/// 第二声道分类为强度频带时, 用第一声道按 `sign × sf` 缩放重建;
/// 非强度游程整段跳过, 既是性能优化也是正确性要求 —— 强度缩放
/// 绝不触碰正常编码频带的内存.
pub fn apply_intensity_stereo<S: Coef>(cpe: &mut ChannelPairElement<S>, ics: &IcsInfo) {
    let runs = cpe.ch[1].band_runs.clone();
    for run in &runs {
        if !run.band_type.is_intensity() {
            continue;
        }
        let base_sign = if run.band_type == BandType::IntensityAlt {
            -1
        } else {
            1
        };
        for sfb in run.start..run.end {
            let idx = run.group * ics.max_sfb + sfb;
            // MS 全局存在时, 掩码位对强度符号再取反一次,
            // 允许强度频带与传输/隐含的 MS 极性共存.
            let sign = if cpe.ms_present != MsPresent::None && cpe.ms_used(idx) {
                -base_sign
            } else {
                base_sign
            };
            let sf = cpe.ch[1].sf[idx];
            let (start, end) = ics.band_range(sfb);
            let [ch0, ch1] = &mut cpe.ch;
            for win in 0..ics.group_len[run.group] {
                let base = (ics.group_start[run.group] + win) * 128;
                let (src, dst) = (
                    &ch0.coeffs[base + start..base + end],
                    &mut ch1.coeffs[base + start..base + end],
                );
                S::intensity_copy(dst, src, sf, sign);
            }
        }
    }
}
