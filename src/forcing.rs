use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use std::f64::consts::PI;

/// `[0, 2π)` を `s` 等分した周期座標のうち、第2空間軸方向に変化する `x2` を `[s, s]` で返します。
pub fn periodic_x2<B: Backend>(s: usize, device: &B::Device) -> Tensor<B, 2> {
    let coords: Vec<f64> = (0..s * s)
        .map(|idx| 2.0 * PI * (idx % s) as f64 / s as f64)
        .collect();
    Tensor::from_data(TensorData::new(coords, [s, s]).convert::<B::FloatElem>(), device)
}

/// コルモゴロフ流の定常外力 `-4·cos(4·x2)` を `[1, s, s, 1]` で返します。
pub fn kolmogorov_forcing<B: Backend>(s: usize, device: &B::Device) -> Tensor<B, 4> {
    periodic_x2::<B>(s, device)
        .mul_scalar(4.0)
        .cos()
        .mul_scalar(-4.0)
        .reshape([1, s, s, 1])
}

/// 上の外力と粘性 `viscosity` で釣り合う定常渦度 `-cos(4·x2) / (4·viscosity)` を
/// `[batch, s, s, nt]` に複製して返します。
///
/// 速度は第1空間軸方向のみ、渦度は第2空間軸方向にのみ変化するため移流項は消え、
/// 残差は粘性項 `-viscosity·Δw` だけになります。
pub fn kolmogorov_steady_vorticity<B: Backend>(
    s: usize,
    nt: usize,
    batch: usize,
    viscosity: f64,
    device: &B::Device,
) -> Tensor<B, 4> {
    periodic_x2::<B>(s, device)
        .mul_scalar(4.0)
        .cos()
        .mul_scalar(-1.0 / (4.0 * viscosity))
        .reshape([1, s, s, 1])
        .repeat_dim(0, batch)
        .repeat_dim(3, nt)
}
