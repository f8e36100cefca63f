//! # 周期格子上のスペクトル微分
//!
//! `burn` には2次元FFTが無いため、実数の離散フーリエ変換行列を `matmul` で
//! 作用させて変換を実現します。すべての演算がテンソル演算なので、
//! `Autodiff` バックエンド上では勾配がそのまま伝播します。
//!
//! 波数は第2空間軸について `k_max + 1` 列（半スペクトル）だけを保持します。
//! 逆変換は `irfft2` と同じ規約で、エルミート対称に補完し、DC列とナイキスト列の
//! 虚部は無視します。

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use log::debug;
use std::f64::consts::PI;

/// 標準的なFFT順序の整数波数 `0..k_max, -k_max..0` を返します。
pub fn fft_wavenumbers(n: usize) -> Vec<f64> {
    let k_max = (n / 2) as i64;
    (0..k_max).chain(-k_max..0).map(|k| k as f64).collect()
}

/// 半スペクトル `[planes, n, k_max + 1]` の実部と虚部。
#[derive(Debug, Clone)]
pub struct Spectrum<B: Backend> {
    pub re: Tensor<B, 3>,
    pub im: Tensor<B, 3>,
}

impl<B: Backend> Spectrum<B> {
    /// `i·k` を掛けます（スペクトル微分）。
    pub fn mul_ik(self, k: Tensor<B, 3>) -> Self {
        Self {
            re: self.im.neg().mul(k.clone()),
            im: self.re.mul(k),
        }
    }

    pub fn mul_real(self, factor: Tensor<B, 3>) -> Self {
        Self {
            re: self.re.mul(factor.clone()),
            im: self.im.mul(factor),
        }
    }

    pub fn div_real(self, divisor: Tensor<B, 3>) -> Self {
        Self {
            re: self.re.div(divisor.clone()),
            im: self.im.div(divisor),
        }
    }

    pub fn neg(self) -> Self {
        Self {
            re: self.re.neg(),
            im: self.im.neg(),
        }
    }
}

/// `n × n` の周期格子に対する変換行列と波数テンソルの組。
///
/// 行列はすべて右から掛ける形 `[入力, 出力]` で保持します。
/// 波数テンソルは `[1, n, k_max + 1]` で、`[planes, n, k_max + 1]` の半スペクトルに
/// ブロードキャストして掛けます。
#[derive(Debug, Clone)]
pub struct SpectralGrid<B: Backend> {
    n: usize,
    forward_cos_y: Tensor<B, 2>,
    forward_sin_y: Tensor<B, 2>,
    cos_x: Tensor<B, 2>,
    sin_x: Tensor<B, 2>,
    inverse_cos_y: Tensor<B, 2>,
    inverse_sin_y: Tensor<B, 2>,
    /// 第1空間軸の波数 `k_x`
    pub k_x: Tensor<B, 3>,
    /// 第2空間軸の波数 `k_y`（`k_max` 列目は `-k_max`）
    pub k_y: Tensor<B, 3>,
    /// `k_x² + k_y²`。ゼロ波数成分は1に置き換えています。
    pub lap: Tensor<B, 3>,
}

impl<B: Backend> SpectralGrid<B> {
    /// 解像度 `n`（偶数）の格子を構築します。
    pub fn new(n: usize, device: &B::Device) -> Self {
        let k_max = n / 2;
        let half = k_max + 1;
        debug!("スペクトル格子を構築: n={}, k_max={}", n, k_max);

        let angle = |k: usize, j: usize| 2.0 * PI * ((k * j) % n) as f64 / n as f64;

        let mut forward_cos_y = Vec::with_capacity(n * half);
        let mut forward_sin_y = Vec::with_capacity(n * half);
        for y in 0..n {
            for k in 0..half {
                forward_cos_y.push(angle(k, y).cos());
                forward_sin_y.push(angle(k, y).sin());
            }
        }

        let mut cos_x = Vec::with_capacity(n * n);
        let mut sin_x = Vec::with_capacity(n * n);
        for x in 0..n {
            for k in 0..n {
                cos_x.push(angle(k, x).cos());
                sin_x.push(angle(k, x).sin());
            }
        }

        // c2r: 0 と k_max 以外の列は共役成分の分を2倍する
        let mut inverse_cos_y = Vec::with_capacity(half * n);
        let mut inverse_sin_y = Vec::with_capacity(half * n);
        for k in 0..half {
            let edge = k == 0 || k == k_max;
            let weight = (if edge { 1.0 } else { 2.0 }) / n as f64;
            for y in 0..n {
                inverse_cos_y.push(weight * angle(k, y).cos());
                inverse_sin_y.push(if edge { 0.0 } else { weight * angle(k, y).sin() });
            }
        }

        let wavenumbers = fft_wavenumbers(n);
        let mut k_x = Vec::with_capacity(n * half);
        let mut k_y = Vec::with_capacity(n * half);
        let mut lap = Vec::with_capacity(n * half);
        for kx in wavenumbers.iter() {
            for ky in wavenumbers.iter().take(half) {
                k_x.push(*kx);
                k_y.push(*ky);
                lap.push(kx * kx + ky * ky);
            }
        }
        // ゼロ除算を避けるための置き換え。流れ関数のDC成分は任意の値になり、
        // 速度のDC成分は k=0 を掛けるので常に0になる。
        lap[0] = 1.0;

        let multiplier =
            |values: Vec<f64>| matrix::<B>(values, n, half, device).reshape([1, n, half]);

        Self {
            n,
            forward_cos_y: matrix(forward_cos_y, n, half, device),
            forward_sin_y: matrix(forward_sin_y, n, half, device),
            cos_x: matrix(cos_x, n, n, device),
            sin_x: matrix(sin_x, n, n, device),
            inverse_cos_y: matrix(inverse_cos_y, half, n, device),
            inverse_sin_y: matrix(inverse_sin_y, half, n, device),
            k_x: multiplier(k_x),
            k_y: multiplier(k_y),
            lap: multiplier(lap),
        }
    }

    pub fn resolution(&self) -> usize {
        self.n
    }

    /// 実数場 `[planes, n, n]` を半スペクトル `[planes, n, k_max + 1]` に変換します。
    ///
    /// 完全な2次元FFTの第2軸を `k_max + 1` 列で切り取ったものと一致します。
    pub fn rfft2(&self, field: Tensor<B, 3>) -> Spectrum<B> {
        let re_y = along_last(field.clone(), self.forward_cos_y.clone());
        let im_y = along_last(field, self.forward_sin_y.clone()).neg();

        let re = along_middle(re_y.clone(), self.cos_x.clone())
            + along_middle(im_y.clone(), self.sin_x.clone());
        let im = along_middle(im_y, self.cos_x.clone()) - along_middle(re_y, self.sin_x.clone());
        Spectrum { re, im }
    }

    /// 半スペクトルを実空間 `[planes, n, n]` に戻します（`irfft2` 相当）。
    pub fn irfft2(&self, spectrum: Spectrum<B>) -> Tensor<B, 3> {
        let scale = 1.0 / self.n as f64;
        let Spectrum { re, im } = spectrum;

        let re_x = (along_middle(re.clone(), self.cos_x.clone())
            - along_middle(im.clone(), self.sin_x.clone()))
        .mul_scalar(scale);
        let im_x = (along_middle(re, self.sin_x.clone()) + along_middle(im, self.cos_x.clone()))
            .mul_scalar(scale);

        along_last(re_x, self.inverse_cos_y.clone()) - along_last(im_x, self.inverse_sin_y.clone())
    }
}

fn matrix<B: Backend>(
    values: Vec<f64>,
    rows: usize,
    cols: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let data = TensorData::new(values, [rows, cols]).convert::<B::FloatElem>();
    Tensor::from_data(data, device)
}

/// 最後の軸に行列を右から掛けます。
fn along_last<B: Backend>(x: Tensor<B, 3>, m: Tensor<B, 2>) -> Tensor<B, 3> {
    let [planes, rows, cols] = x.dims();
    let out = m.dims()[1];
    x.reshape([planes * rows, cols])
        .matmul(m)
        .reshape([planes, rows, out])
}

/// 真ん中の軸（第1空間軸）を `m` で変換します。
///
/// `m` は `[入力, 出力]` の形なので、転置して各面に左から掛けます。
fn along_middle<B: Backend>(x: Tensor<B, 3>, m: Tensor<B, 2>) -> Tensor<B, 3> {
    m.transpose().unsqueeze::<3>().matmul(x)
}
