//! 窗表构建与朴素参考前向 MDCT.
//!
//! 前向 MDCT 仅服务于 LTP 预测路径 (时域预测信号变换回频域),
//! 与输出侧的 IMDCT/overlap-add 无关, 后者属于外部合成阶段.
//!
//! 窗表统一存为上升半窗 (长窗 1024 点, 短窗 128 点), 下降沿通过
//! 逆序索引获得; 构建在 f64 精度完成后转换到当前数值域.

use super::WindowShape;
use super::numeric::Coef;

/// 前向 MDCT: 2048 点时域输入 → 1024 点频谱.
pub fn forward_mdct_1024<S: Coef>(time: &[S]) -> Vec<S> {
    let n = 1024usize;
    let mut output = vec![S::ZERO; n];

    // 快速路径: 全零
    if time.iter().all(|&s| s == S::ZERO) {
        return output;
    }

    let half_n = n as f64 / 2.0;
    for (k, out) in output.iter_mut().enumerate() {
        let k_plus_half = k as f64 + 0.5;
        let mut sum = 0.0f64;
        for (i, &s) in time.iter().enumerate() {
            let v = s.sample_to_f64();
            if v == 0.0 {
                continue;
            }
            let angle = std::f64::consts::PI / n as f64 * (i as f64 + 0.5 + half_n) * k_plus_half;
            sum += v * angle.cos();
        }
        *out = S::sample_from_f64(sum);
    }
    output
}

/// 每声道一份的分析窗组: sine 与 KBD 各一长一短.
pub struct WindowBank<S> {
    long_sine: Vec<S>,
    long_kbd: Vec<S>,
    short_sine: Vec<S>,
    short_kbd: Vec<S>,
}

impl<S: Coef> WindowBank<S> {
    pub fn new() -> Self {
        Self {
            long_sine: build_sine_window(1024),
            long_kbd: build_kbd_window(1024, 4.0),
            short_sine: build_sine_window(128),
            short_kbd: build_kbd_window(128, 6.0),
        }
    }

    /// 长窗上升半窗 (1024 点).
    pub fn long(&self, shape: WindowShape) -> &[S] {
        match shape {
            WindowShape::Sine => &self.long_sine,
            WindowShape::Kbd => &self.long_kbd,
        }
    }

    /// 短窗上升半窗 (128 点).
    pub fn short(&self, shape: WindowShape) -> &[S] {
        match shape {
            WindowShape::Sine => &self.short_sine,
            WindowShape::Kbd => &self.short_kbd,
        }
    }
}

impl<S: Coef> Default for WindowBank<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// 构建 sine 上升半窗.
pub fn build_sine_window<S: Coef>(len: usize) -> Vec<S> {
    (0..len)
        .map(|i| {
            S::window_from_f64((std::f64::consts::PI / (2.0 * len as f64) * (i as f64 + 0.5)).sin())
        })
        .collect()
}

/// 构建 KBD (Kaiser–Bessel Derived) 上升半窗.
pub fn build_kbd_window<S: Coef>(len: usize, alpha: f64) -> Vec<S> {
    if len < 2 {
        return build_sine_window(len);
    }

    let len_f = len as f64;
    let mut proto = vec![0.0f64; len];
    for (i, slot) in proto.iter_mut().enumerate() {
        let x = (2.0 * i as f64) / len_f - 1.0;
        let arg = alpha * std::f64::consts::PI * (1.0 - x * x).max(0.0).sqrt();
        *slot = bessel_i0(arg);
    }

    let mut cum = vec![0.0f64; len];
    let mut running = 0.0f64;
    for (i, &v) in proto.iter().enumerate() {
        running += v;
        cum[i] = running;
    }
    let denom = cum[len - 1].max(f64::EPSILON);

    cum.iter()
        .map(|&c| S::window_from_f64((c / denom).sqrt()))
        .collect()
}

/// 第一类修正贝塞尔函数 I0.
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let half = x * 0.5;
    let mut k = 1.0f64;
    loop {
        term *= (half * half) / (k * k);
        sum += term;
        if term < 1e-12 * sum {
            break;
        }
        k += 1.0;
        if k > 50.0 {
            break;
        }
    }
    sum
}
