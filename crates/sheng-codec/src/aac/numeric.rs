//! 双数值域抽象: 浮点与定点共用同一套频谱重建控制流.
//!
//! 核心逻辑只写一次, 针对 [`Coef`] 抽象实例化两个数值域:
//! - `f32`: 浮点域, scalefactor 映射为线性增益, 乘法为普通浮点乘.
//! - `i32`: 定点域, Q 格式约定如下:
//!   - 频谱/时域样本: 整数幅值
//!   - TNS 反射系数与 LPC 抽头: Q30
//!   - LTP 预测系数: Q30
//!   - 窗表: Q31
//!   - scalefactor: 整数指数码, 线性增益为 2^((sf-100)/4)
//!
//! 两个域的 scalefactor 映射在标准量化步长下数值一致 (同一条
//! 四分之一幂二次方梯子), 一致性由测试逐点验证而非假定.

use std::fmt::Debug;

/// 2^(k/4) 的 Q31 尾数, k = 0..4. 定点域强度立体声缩放用.
const EXP2_FRAC_Q31: [i64; 4] = [
    2_147_483_648, // 2^0
    2_553_802_834, // 2^(1/4)
    3_037_000_500, // 2^(1/2)
    3_611_622_603, // 2^(3/4)
];

/// 频谱系数的数值域契约.
///
/// 实现者提供加减、三种带移位语义的乘法 (滤波抽头/预测系数/窗),
/// scalefactor 的四种反量化映射, 以及立体声用的区间蝶形与缩放拷贝.
pub trait Coef: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    /// 加法单位元.
    const ZERO: Self;

    fn add(self, rhs: Self) -> Self;
    fn sub(self, rhs: Self) -> Self;

    /// TNS 递归: 样本 × LPC 抽头 (定点为 Q30 乘, 舍入移位).
    fn mul_tap(self, tap: Self) -> Self;
    /// LTP 预测: 历史样本 × 预测系数 (定点为 Q30 乘, 舍入移位).
    fn mul_pred(self, coef: Self) -> Self;
    /// 加窗: 样本 × 窗值 (定点为 Q31 乘, 舍入移位).
    fn mul_win(self, w: Self) -> Self;

    /// 普通频带映射: 指数梯子取负.
    fn dequant_normal(sfo: i32) -> Self;
    /// 强度立体声频带映射: 线性增益 (或等价整数指数码), 恒为正.
    fn dequant_intensity(sfo: i32) -> Self;
    /// 噪声替代频带映射: 强度映射取负且偏移不同 (存储能量而非幅值).
    fn dequant_noise(sfo: i32) -> Self;

    /// 和差蝶形: (l, r) → (l+r, l−r), 逐样本作用于两段等长区间.
    fn butterflies(ch0: &mut [Self], ch1: &mut [Self]);
    /// 缩放拷贝: dst = src × (sign × sf 对应的线性增益), sign 取 ±1.
    fn intensity_copy(dst: &mut [Self], src: &[Self], sf: Self, sign: i32);

    /// 由 f64 构建窗表值 (定点为 Q31).
    fn window_from_f64(x: f64) -> Self;
    /// 由 f64 构建滤波/预测系数 (定点为 Q30).
    fn coef_from_f64(x: f64) -> Self;
    /// 频谱样本与 f64 的桥接, 朴素参考 MDCT 用.
    fn sample_from_f64(x: f64) -> Self;
    fn sample_to_f64(self) -> f64;

    /// 非有限值归零, 阻止 NaN/Inf 进入共享频谱与 LTP 历史; 定点域恒等.
    fn sanitize(self) -> Self;
}

impl Coef for f32 {
    const ZERO: Self = 0.0;

    fn add(self, rhs: Self) -> Self {
        self + rhs
    }

    fn sub(self, rhs: Self) -> Self {
        self - rhs
    }

    fn mul_tap(self, tap: Self) -> Self {
        self * tap
    }

    fn mul_pred(self, coef: Self) -> Self {
        self * coef
    }

    fn mul_win(self, w: Self) -> Self {
        self * w
    }

    fn dequant_normal(sfo: i32) -> Self {
        -(2.0f32.powf(0.25 * (sfo - 100) as f32))
    }

    fn dequant_intensity(sfo: i32) -> Self {
        2.0f32.powf(0.25 * (-sfo) as f32)
    }

    fn dequant_noise(sfo: i32) -> Self {
        -(2.0f32.powf(0.25 * sfo as f32))
    }

    fn butterflies(ch0: &mut [Self], ch1: &mut [Self]) {
        for (l, r) in ch0.iter_mut().zip(ch1.iter_mut()) {
            let a = *l;
            let b = *r;
            *l = a + b;
            *r = a - b;
        }
    }

    fn intensity_copy(dst: &mut [Self], src: &[Self], sf: Self, sign: i32) {
        let scale = sf * sign as f32;
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            *d = s * scale;
        }
    }

    fn window_from_f64(x: f64) -> Self {
        x as f32
    }

    fn coef_from_f64(x: f64) -> Self {
        x as f32
    }

    fn sample_from_f64(x: f64) -> Self {
        x as f32
    }

    fn sample_to_f64(self) -> f64 {
        self as f64
    }

    fn sanitize(self) -> Self {
        if self.is_finite() { self } else { 0.0 }
    }
}

impl Coef for i32 {
    const ZERO: Self = 0;

    fn add(self, rhs: Self) -> Self {
        self.wrapping_add(rhs)
    }

    fn sub(self, rhs: Self) -> Self {
        self.wrapping_sub(rhs)
    }

    fn mul_tap(self, tap: Self) -> Self {
        mul_shift(self, tap, 30)
    }

    fn mul_pred(self, coef: Self) -> Self {
        mul_shift(self, coef, 30)
    }

    fn mul_win(self, w: Self) -> Self {
        mul_shift(self, w, 31)
    }

    fn dequant_normal(sfo: i32) -> Self {
        -sfo
    }

    fn dequant_intensity(sfo: i32) -> Self {
        100 - sfo
    }

    fn dequant_noise(sfo: i32) -> Self {
        -(100 + sfo)
    }

    fn butterflies(ch0: &mut [Self], ch1: &mut [Self]) {
        for (l, r) in ch0.iter_mut().zip(ch1.iter_mut()) {
            let a = *l;
            let b = *r;
            *l = a.wrapping_add(b);
            *r = a.wrapping_sub(b);
        }
    }

    fn intensity_copy(dst: &mut [Self], src: &[Self], sf: Self, sign: i32) {
        // 增益 2^((sf-100)/4): floor 分解为整数移位 + 四分之一幂 Q31 尾数
        let e = sf - 100;
        let shift = e >> 2;
        let frac = (e - (shift << 2)) as usize;
        let m = EXP2_FRAC_Q31[frac];
        for (d, &s) in dst.iter_mut().zip(src.iter()) {
            let scaled = (s as i64 * m + (1 << 30)) >> 31;
            *d = shift_round_sat(scaled, shift).wrapping_mul(sign);
        }
    }

    fn window_from_f64(x: f64) -> Self {
        quantize(x, 31)
    }

    fn coef_from_f64(x: f64) -> Self {
        quantize(x, 30)
    }

    fn sample_from_f64(x: f64) -> Self {
        quantize(x, 0)
    }

    fn sample_to_f64(self) -> f64 {
        self as f64
    }

    fn sanitize(self) -> Self {
        self
    }
}

/// 定点乘: (a × b) 右移 `bits` 位, 半值进位舍入.
#[inline]
fn mul_shift(a: i32, b: i32, bits: u32) -> i32 {
    ((a as i64 * b as i64 + (1i64 << (bits - 1))) >> bits) as i32
}

/// i64 值按 shift 左移 (饱和) 或右移 (舍入), 钳制到 i32 范围.
#[inline]
fn shift_round_sat(v: i64, shift: i32) -> i32 {
    let r = if shift >= 0 {
        let s = shift.min(32) as u32;
        v.saturating_mul(1i64 << s)
    } else {
        let s = (-shift).min(62) as u32;
        (v + (1i64 << (s - 1))) >> s
    };
    r.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// f64 → 定点 Q`bits`, 四舍五入并饱和.
#[inline]
fn quantize(x: f64, bits: u32) -> i32 {
    let scaled = x * (1u64 << bits) as f64;
    if !scaled.is_finite() {
        return 0;
    }
    scaled.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
