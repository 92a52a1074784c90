//! TNS (Temporal Noise Shaping) 频域递归滤波 (ISO 14496-3, 4.6.9).
//!
//! 滤波槽按传输顺序处理, 对应从 Nyquist 端向下递减的频带区间.
//! 每个滤波器只在自己的区间内有状态, 因此区间起点处以
//! `min(m, order)` 个抽头渐进启动.

use super::IcsInfo;
use super::numeric::Coef;

/// 滤波器最大阶数.
pub const TNS_MAX_ORDER: usize = 20;
/// 每个窗口的最大滤波器槽数.
pub const TNS_MAX_FILT: usize = 4;

/// 每窗口/每滤波槽的 TNS 参数, 系数为反射系数 (转换前).
#[derive(Clone)]
pub struct TnsData<S> {
    pub n_filt: [usize; 8],
    pub length: [[usize; TNS_MAX_FILT]; 8],
    pub order: [[usize; TNS_MAX_FILT]; 8],
    pub direction: [[bool; TNS_MAX_FILT]; 8],
    pub coef: [[[S; TNS_MAX_ORDER]; TNS_MAX_FILT]; 8],
}

impl<S: Coef> Default for TnsData<S> {
    fn default() -> Self {
        Self {
            n_filt: [0; 8],
            length: [[0; TNS_MAX_FILT]; 8],
            order: [[0; TNS_MAX_FILT]; 8],
            direction: [[false; TNS_MAX_FILT]; 8],
            coef: [[[S::ZERO; TNS_MAX_ORDER]; TNS_MAX_FILT]; 8],
        }
    }
}

/// 将反射系数转换为直接型 LPC 抽头 (step-up 递归).
pub fn compute_lpc<S: Coef>(coefs: &[S], lpc: &mut [S; TNS_MAX_ORDER]) {
    lpc.fill(S::ZERO);
    if coefs.is_empty() {
        return;
    }
    lpc[0] = coefs[0];
    for i in 1..coefs.len() {
        let r = coefs[i];
        for j in 0..(i / 2) {
            let tmp = r.mul_tap(lpc[j]);
            lpc[j] = lpc[j].add(r.mul_tap(lpc[i - 1 - j]));
            lpc[i - 1 - j] = lpc[i - 1 - j].add(tmp);
        }
        if i % 2 != 0 {
            let j = i / 2;
            lpc[j] = lpc[j].add(r.mul_tap(lpc[j]));
        }
        lpc[i] = r;
    }
}

/// 对一个声道的频谱应用 TNS 滤波, 逐窗口逐滤波槽就地处理.
///
/// `decode` 为 true 时执行 AR 解码方向递归; 为 false 时执行 MA 合成
/// 方向递归 (LTP 预测频谱的整形复用这一路径). 阶数为零或区间为空的
/// 滤波器是空操作.
pub fn apply_tns<S: Coef>(coeffs: &mut [S], tns: &TnsData<S>, ics: &IcsInfo, decode: bool) {
    let mmm = ics.tns_max_bands.min(ics.max_sfb);
    if mmm == 0 {
        return;
    }

    let mut lpc = [S::ZERO; TNS_MAX_ORDER];
    let mut tmp = [S::ZERO; TNS_MAX_ORDER + 1];

    for w in 0..ics.num_windows {
        let mut bottom = ics.num_swb;
        for filt in 0..tns.n_filt[w].min(TNS_MAX_FILT) {
            let top = bottom;
            bottom = top.saturating_sub(tns.length[w][filt]);
            let order = tns.order[w][filt].min(TNS_MAX_ORDER);
            if order == 0 {
                continue;
            }

            compute_lpc(&tns.coef[w][filt][..order], &mut lpc);

            let start = ics.swb_offset[bottom.min(mmm)];
            let end = ics.swb_offset[top.min(mmm)];
            let size = end.saturating_sub(start);
            if size == 0 {
                continue;
            }

            let inc: isize = if tns.direction[w][filt] { -1 } else { 1 };
            let mut pos = if tns.direction[w][filt] {
                (w * 128 + end - 1) as isize
            } else {
                (w * 128 + start) as isize
            };

            if decode {
                // AR 白化递归: 减去前 min(m, order) 个已更新样本的加权和
                for m in 0..size {
                    let idx = pos as usize;
                    let mut acc = coeffs[idx];
                    for i in 1..=m.min(order) {
                        let src = (pos - i as isize * inc) as usize;
                        acc = acc.sub(coeffs[src].mul_tap(lpc[i - 1]));
                    }
                    coeffs[idx] = acc;
                    pos += inc;
                }
            } else {
                // MA 合成递归: 滤波前输入经 order+1 深的移位寄存器延迟
                for m in 0..size {
                    let idx = pos as usize;
                    tmp[0] = coeffs[idx];
                    let mut acc = coeffs[idx];
                    for i in 1..=m.min(order) {
                        acc = acc.add(tmp[i].mul_tap(lpc[i - 1]));
                    }
                    coeffs[idx] = acc;
                    for i in (1..=order).rev() {
                        tmp[i] = tmp[i - 1];
                    }
                    pos += inc;
                }
            }
        }
    }
}
