use crate::spectral::{SpectralGrid, Spectrum};
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use log::trace;

/// 渦度輸送方程式の残差を計算します。
///
/// `w` は `[batch, nx, ny, nt]` の渦度場で、空間方向は `[0, 2π)` の周期格子、
/// 時間方向は `t_interval` を `nt - 1` 等分した一様格子です。`nx == ny` かつ偶数、
/// `nt >= 3` を前提とし、形状は検証しません（必要なら [`crate::error::check_vorticity_dims`]）。
///
/// 1. 空間2次元のフーリエ変換 `w_h` を求め、ポアソン方程式 `f_h = w_h / |k|²` から
///    流れ関数を復元します。
/// 2. `u = (∂f/∂y, -∂f/∂x)`、`∇w`、`Δw` をスペクトル微分で求めます。
/// 3. 時間微分は中心差分 `(w[t+1] - w[t-1]) / (2·dt)` です。
///
/// 戻り値は内部の時刻 `1..nt-1` における `∂w/∂t + u·∇w - ν·Δw` で、形状は
/// `[batch, nx, ny, nt - 2]` です。
///
/// # 注意
///
/// * 外力項は差し引いていません。外力との比較は [`crate::pino::pino_loss_3d`] 側で行います。
/// * `|k|²` のゼロ波数成分は1に置き換えているため、流れ関数の平均値は任意です。
///   速度には影響しませんが、同じ `|k|²` を使う `Δw` のDC成分は `-mean(w)` になります。
pub fn fdm_ns_vorticity<B: Backend>(
    w: Tensor<B, 4>,
    viscosity: f64,
    t_interval: f64,
) -> Tensor<B, 4> {
    let [batch, nx, ny, nt] = w.dims();
    let device = w.device();
    let grid = SpectralGrid::<B>::new(nx, &device);
    trace!(
        "渦度残差: batch={}, n={}, nt={}, viscosity={}, t_interval={}",
        batch,
        grid.resolution(),
        nt,
        viscosity,
        t_interval
    );

    let planes = w.clone().permute([0, 3, 1, 2]).reshape([batch * nt, nx, ny]);
    let w_h = grid.rfft2(planes);

    // 流れ関数
    let f_h = w_h.clone().div_real(grid.lap.clone());

    let ux_h = f_h.clone().mul_ik(grid.k_y.clone());
    let uy_h = f_h.mul_ik(grid.k_x.clone()).neg();
    let wx_h = w_h.clone().mul_ik(grid.k_x.clone());
    let wy_h = w_h.clone().mul_ik(grid.k_y.clone());
    let wlap_h = w_h.mul_real(grid.lap.clone()).neg();

    let to_field = |spectrum: Spectrum<B>| {
        grid.irfft2(spectrum)
            .reshape([batch, nt, nx, ny])
            .permute([0, 2, 3, 1])
    };
    let ux = to_field(ux_h);
    let uy = to_field(uy_h);
    let wx = to_field(wx_h);
    let wy = to_field(wy_h);
    let wlap = to_field(wlap_h);

    let dt = t_interval / (nt - 1) as f64;
    let wt = (w.clone().slice([0..batch, 0..nx, 0..ny, 2..nt])
        - w.slice([0..batch, 0..nx, 0..ny, 0..nt - 2]))
    .div_scalar(2.0 * dt);

    let transport = ux * wx + uy * wy - wlap.mul_scalar(viscosity);
    wt + transport.slice([0..batch, 0..nx, 0..ny, 1..nt - 1])
}
