//! LTP (Long Term Prediction) 长时预测 (ISO 14496-3, 4.6.6).
//!
//! 预测只对单窗长块定义; 历史为固定 3 帧深 (3 × 1024 时域样本) 的
//! 环形缓冲, 每帧丢弃最旧的三分之一并追加新的三分之一, 由本模块
//! 独占维护.

use log::debug;

use super::mdct::{WindowBank, forward_mdct_1024};
use super::numeric::Coef;
use super::tns::{TnsData, apply_tns};
use super::{IcsInfo, LTP_MAX_LONG_SFB, WindowSequence};

/// 预测系数码表: 传输的 3 位索引映射到标量预测增益.
const LTP_COEF_TABLE: [f64; 8] = [
    0.570829, 0.696616, 0.813004, 0.911304, 0.984900, 1.067894, 1.194601, 1.369533,
];

/// 由传输索引取预测系数 (定点域为 Q30).
pub fn ltp_coef_from_index<S: Coef>(index: usize) -> S {
    S::coef_from_f64(LTP_COEF_TABLE[index & 7])
}

/// 每帧传输的 LTP 参数.
#[derive(Clone, Copy)]
pub struct LtpData<S> {
    /// 预测滞后, 取值 [0, 2048).
    pub lag: usize,
    /// 标量预测增益.
    pub coef: S,
    /// 按频带的启用门控, 仅前 `min(max_sfb, LTP_MAX_LONG_SFB)` 位有效.
    pub used: [bool; LTP_MAX_LONG_SFB],
}

impl<S: Coef> Default for LtpData<S> {
    fn default() -> Self {
        Self {
            lag: 0,
            coef: S::ZERO,
            used: [false; LTP_MAX_LONG_SFB],
        }
    }
}

/// 跨帧时域历史: 固定容量 3 × 1024, 与声道对象同生命周期.
pub struct LtpState<S> {
    history: Vec<S>,
}

impl<S: Coef> LtpState<S> {
    pub fn new() -> Self {
        Self {
            history: vec![S::ZERO; 3 * 1024],
        }
    }

    /// 历史缓冲只读视图 (最旧 → 最新).
    pub fn history(&self) -> &[S] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.fill(S::ZERO);
    }
}

impl<S: Coef> Default for LtpState<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// 应用长时预测: 从历史构建时域预测信号, 加窗 + 前向 MDCT 回频域,
/// 若本帧存在 TNS 则以合成方向整形, 最后按频带门控叠加进当前频谱.
///
/// 八短块直接返回, 频谱完全不被修改.
pub fn apply_ltp<S: Coef>(
    coeffs: &mut [S],
    tns: Option<&TnsData<S>>,
    ltp: &LtpData<S>,
    state: &LtpState<S>,
    ics: &IcsInfo,
    windows: &WindowBank<S>,
) {
    if ics.window_sequence.is_eight_short() {
        return;
    }
    debug!("AAC LTP: lag={}, coef={:?}", ltp.lag, ltp.coef);

    let lag = ltp.lag.min(2048);
    let num_samples = (lag + 1024).min(2048);
    let mut pred_time = vec![S::ZERO; 2048];
    let history = state.history();
    for i in 0..num_samples {
        pred_time[i] = history[i + 2048 - lag].mul_pred(ltp.coef);
    }

    let mut pred_freq = windowing_and_mdct_ltp(&mut pred_time, ics, windows);
    if let Some(tns) = tns {
        apply_tns(&mut pred_freq, tns, ics, false);
    }

    for sfb in 0..ics.max_sfb.min(LTP_MAX_LONG_SFB) {
        if !ltp.used[sfb] {
            continue;
        }
        let (start, end) = ics.band_range(sfb);
        for i in start..end {
            coeffs[i] = coeffs[i].add(pred_freq[i].sanitize());
        }
    }
}

/// 预测信号按块类型加窗后做前向 MDCT.
///
/// 长停块的前半帧用短窗上升沿 (前 448 样本清零), 长起块的后半帧用
/// 短窗下降沿 (尾部 448 样本清零), 其余块型两半都加长窗.
fn windowing_and_mdct_ltp<S: Coef>(
    time: &mut [S],
    ics: &IcsInfo,
    windows: &WindowBank<S>,
) -> Vec<S> {
    let lwindow = windows.long(ics.window_shape);
    let swindow = windows.short(ics.window_shape);
    let lwindow_prev = windows.long(ics.prev_window_shape);
    let swindow_prev = windows.short(ics.prev_window_shape);

    if ics.window_sequence != WindowSequence::LongStop {
        for i in 0..1024 {
            time[i] = time[i].mul_win(lwindow_prev[i]);
        }
    } else {
        for t in time.iter_mut().take(448) {
            *t = S::ZERO;
        }
        for i in 0..128 {
            time[448 + i] = time[448 + i].mul_win(swindow_prev[i]);
        }
    }
    if ics.window_sequence != WindowSequence::LongStart {
        for i in 0..1024 {
            time[1024 + i] = time[1024 + i].mul_win(lwindow[1023 - i]);
        }
    } else {
        for i in 0..128 {
            time[1472 + i] = time[1472 + i].mul_win(swindow[127 - i]);
        }
        for t in time.iter_mut().skip(1600) {
            *t = S::ZERO;
        }
    }
    forward_mdct_1024(time)
}

/// 帧合成后刷新 LTP 历史 (每帧无条件调用, 与块类型无关).
///
/// 先按块类型把后 MDCT 缓冲的尾部加窗、时间反转折算成新的历史尾段,
/// 再滑动环形缓冲: 丢弃最旧 1024, 中段写入本帧合成输出, 尾段写入
/// 折算结果. 非有限值在进入历史前归零.
///
/// `buf_mdct` 为本帧 IMDCT 输出 (至少前 1024 个样本), `output` 为
/// overlap-add 之后的 1024 点合成输出, `saved` 为外部合成阶段保留的
/// 重叠段.
pub fn update_ltp_state<S: Coef>(
    state: &mut LtpState<S>,
    ics: &IcsInfo,
    buf_mdct: &[S],
    output: &[S],
    saved: &[S],
    windows: &WindowBank<S>,
) {
    let lwindow = windows.long(ics.window_shape);
    let swindow = windows.short(ics.window_shape);
    let mut tail = vec![S::ZERO; 1024];

    match ics.window_sequence {
        WindowSequence::EightShort => {
            tail[..512].copy_from_slice(&saved[..512]);
            for i in 0..64 {
                tail[448 + i] = buf_mdct[960 + i].mul_win(swindow[127 - i]);
            }
            for i in 0..64 {
                tail[512 + i] = buf_mdct[1023 - i].mul_win(swindow[63 - i]);
            }
        }
        WindowSequence::LongStart => {
            tail[..448].copy_from_slice(&buf_mdct[512..960]);
            for i in 0..64 {
                tail[448 + i] = buf_mdct[960 + i].mul_win(swindow[127 - i]);
            }
            for i in 0..64 {
                tail[512 + i] = buf_mdct[1023 - i].mul_win(swindow[63 - i]);
            }
        }
        WindowSequence::OnlyLong | WindowSequence::LongStop => {
            for i in 0..512 {
                tail[i] = buf_mdct[512 + i].mul_win(lwindow[1023 - i]);
            }
            for i in 0..512 {
                tail[512 + i] = buf_mdct[1023 - i].mul_win(lwindow[511 - i]);
            }
        }
    }

    state.history.copy_within(1024..2048, 0);
    for i in 0..1024 {
        state.history[1024 + i] = output[i].sanitize();
    }
    for i in 0..1024 {
        state.history[2048 + i] = tail[i].sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aac::{IcsInfo, WindowShape};

    fn long_ics(max_sfb: usize, swb_offset: Vec<usize>) -> IcsInfo {
        IcsInfo::only_long(max_sfb, swb_offset).unwrap()
    }

    fn short_ics() -> IcsInfo {
        IcsInfo::new(
            WindowSequence::EightShort,
            WindowShape::Sine,
            WindowShape::Sine,
            2,
            vec![0, 4, 8],
            1,
            [8, 0, 0, 0, 0, 0, 0, 0],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_环形缓冲滑动() {
        let ics = long_ics(1, vec![0, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![0.0f32; 1024];
        let saved = vec![0.0f32; 1024];

        // 注入三帧不同的标记输出, 验证历史始终是最近三帧的拼接
        for marker in 1..=3 {
            let output = vec![marker as f32; 1024];
            update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);
        }
        let h = state.history();
        assert!(h[..1024].iter().all(|&v| v == 2.0));
        assert!(h[1024..2048].iter().all(|&v| v == 3.0));
        // buf_mdct 全零 → 折算尾段为零
        assert!(h[2048..].iter().all(|&v| v == 0.0));

        let output = vec![4.0f32; 1024];
        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);
        let h = state.history();
        assert!(h[..1024].iter().all(|&v| v == 3.0));
        assert!(h[1024..2048].iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_更新尾段按长窗折算() {
        let ics = long_ics(1, vec![0, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![1.0f32; 1024];
        let output = vec![0.0f32; 1024];
        let saved = vec![0.0f32; 1024];

        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);
        let h = state.history();
        let lw = windows.long(WindowShape::Sine);
        // tail[0] = buf_mdct[512] * lwindow[1023], tail[512] = buf_mdct[1023] * lwindow[511]
        assert!((h[2048] - lw[1023]).abs() < 1e-7);
        assert!((h[2048 + 512] - lw[511]).abs() < 1e-7);
    }

    #[test]
    fn test_八短块更新拼接重叠段() {
        let ics = short_ics();
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![0.0f32; 1024];
        let output = vec![0.0f32; 1024];
        let saved = vec![5.0f32; 1024];

        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);
        let h = state.history();
        // 前 448 样本直接来自重叠缓冲; 448..512 被短窗折算段覆盖 (此处为零)
        assert!(h[2048..2048 + 448].iter().all(|&v| v == 5.0));
        assert!(h[2048 + 448..2048 + 512].iter().all(|&v| v == 0.0));
        assert!(h[2048 + 576..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_八短块不应用预测() {
        let ics = short_ics();
        let windows = WindowBank::<f32>::new();
        let state = LtpState::<f32>::new();
        let mut ltp = LtpData::<f32>::default();
        ltp.lag = 512;
        ltp.coef = 1.0;
        ltp.used = [true; LTP_MAX_LONG_SFB];

        let mut coeffs: Vec<f32> = (0..1024).map(|i| i as f32).collect();
        let before = coeffs.clone();
        apply_ltp(&mut coeffs, None, &ltp, &state, &ics, &windows);
        assert_eq!(coeffs, before);
    }

    #[test]
    fn test_lag0_从历史尾段预测() {
        let ics = long_ics(1, vec![0, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        // 先通过一次更新把非零输出送进历史中段, 再滑到尾段
        let buf_mdct = vec![0.0f32; 1024];
        let saved = vec![0.0f32; 1024];
        let output: Vec<f32> = (0..1024).map(|i| ((i % 64) as f32) - 32.0).collect();
        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);

        let mut ltp = LtpData::<f32>::default();
        ltp.lag = 0;
        ltp.coef = ltp_coef_from_index(4);
        ltp.used[0] = true;

        let mut coeffs = vec![0.0f32; 1024];
        apply_ltp(&mut coeffs, None, &ltp, &state, &ics, &windows);
        // lag=0: 预测完全取自偏移 2048 的历史尾段; 中段非零不可见.
        // 本例尾段为零 → 预测为零
        assert!(coeffs.iter().all(|&c| c == 0.0));

        // 再滑动一帧, 让非零输出进入尾段所在的第三个三分之一
        let output2 = vec![0.0f32; 1024];
        update_ltp_state(&mut state, &ics, &buf_mdct, &output2, &saved, &windows);
        // 历史: [output, output2(0), tail(0)] → lag=1024 时预测读中段
        let mut ltp2 = LtpData::<f32>::default();
        ltp2.lag = 1024;
        ltp2.coef = 1.0;
        ltp2.used[0] = true;
        let mut coeffs2 = vec![0.0f32; 1024];
        apply_ltp(&mut coeffs2, None, &ltp2, &state, &ics, &windows);
        assert!(coeffs2.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_lag_超过1024_不越界() {
        let ics = long_ics(2, vec![0, 64, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![0.5f32; 1024];
        let saved = vec![0.0f32; 1024];
        let output = vec![1.0f32; 1024];
        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);

        let mut ltp = LtpData::<f32>::default();
        ltp.lag = 2000;
        ltp.coef = 0.9849;
        ltp.used = [true; LTP_MAX_LONG_SFB];

        let mut coeffs = vec![0.0f32; 1024];
        apply_ltp(&mut coeffs, None, &ltp, &state, &ics, &windows);
        assert!(coeffs.iter().all(|c| c.is_finite()));
        assert!(coeffs.iter().any(|&c| c != 0.0));
    }

    #[test]
    fn test_used_门控关闭时频谱不变() {
        let ics = long_ics(2, vec![0, 64, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![0.25f32; 1024];
        let saved = vec![0.0f32; 1024];
        let output = vec![2.0f32; 1024];
        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);

        let ltp = LtpData::<f32> {
            lag: 512,
            coef: 1.0,
            used: [false; LTP_MAX_LONG_SFB],
        };
        let mut coeffs = vec![3.0f32; 1024];
        apply_ltp(&mut coeffs, None, &ltp, &state, &ics, &windows);
        assert!(coeffs.iter().all(|&c| c == 3.0));
    }

    #[test]
    fn test_非有限值不进入历史() {
        let ics = long_ics(1, vec![0, 128]);
        let windows = WindowBank::<f32>::new();
        let mut state = LtpState::<f32>::new();
        let buf_mdct = vec![f32::NAN; 1024];
        let mut output = vec![0.0f32; 1024];
        output[0] = f32::INFINITY;
        let saved = vec![0.0f32; 1024];

        update_ltp_state(&mut state, &ics, &buf_mdct, &output, &saved, &windows);
        assert!(state.history().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_预测系数码表单调() {
        for i in 1..8 {
            let prev: f32 = ltp_coef_from_index(i - 1);
            let cur: f32 = ltp_coef_from_index(i);
            assert!(cur > prev);
        }
    }
}
