use crate::loss::LpLoss;
use crate::vorticity::fdm_ns_vorticity;
use crate::{DEFAULT_T_INTERVAL, DEFAULT_VISCOSITY};
use burn::config::Config;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use log::debug;

/// PINO損失（初期条件損失と方程式残差損失）を計算します。
///
/// * `u` - 予測された渦度場 `[batch, nx, ny, nt]`
/// * `u0` - 初期条件 `[batch, nx, ny]`
/// * `forcing` - 定常外力 `[1, nx, ny, 1]`
///
/// 初期条件損失は `u[..., 0]` と `u0` の相対 L2 誤差、方程式損失は
/// [`fdm_ns_vorticity`] の残差と外力との相対 L2 誤差で、どちらもバッチ平均です。
pub fn pino_loss_3d<B: Backend>(
    u: Tensor<B, 4>,
    u0: Tensor<B, 3>,
    forcing: Tensor<B, 4>,
    viscosity: f64,
    t_interval: f64,
) -> (Tensor<B, 1>, Tensor<B, 1>) {
    let [batch, nx, ny, nt] = u.dims();
    let lploss = LpLoss::default();

    let u_in = u.clone().slice([0..batch, 0..nx, 0..ny, 0..1]).reshape([batch, nx, ny]);
    let loss_ic = lploss.rel(u_in, u0);

    let du = fdm_ns_vorticity(u, viscosity, t_interval);
    let f = forcing.repeat_dim(0, batch).repeat_dim(3, nt - 2);
    let loss_f = lploss.rel(du, f);

    (loss_ic, loss_f)
}

/// [`PinoLoss`] の設定。
#[derive(Config, Debug)]
pub struct PinoLossConfig {
    /// 動粘性係数 ν
    #[config(default = "DEFAULT_VISCOSITY")]
    pub viscosity: f64,
    /// 時間方向の格子が覆う時間幅
    #[config(default = "DEFAULT_T_INTERVAL")]
    pub t_interval: f64,
    /// 初期条件損失の重み
    #[config(default = 1.0)]
    pub ic_weight: f64,
    /// 方程式損失の重み
    #[config(default = 1.0)]
    pub f_weight: f64,
}

impl PinoLossConfig {
    pub fn init(&self) -> PinoLoss {
        PinoLoss {
            viscosity: self.viscosity,
            t_interval: self.t_interval,
            ic_weight: self.ic_weight,
            f_weight: self.f_weight,
        }
    }
}

/// 重み付きのPINO損失。
#[derive(Debug, Clone)]
pub struct PinoLoss {
    viscosity: f64,
    t_interval: f64,
    ic_weight: f64,
    f_weight: f64,
}

impl PinoLoss {
    pub fn forward<B: Backend>(
        &self,
        u: Tensor<B, 4>,
        u0: Tensor<B, 3>,
        forcing: Tensor<B, 4>,
    ) -> PinoLossOutput<B> {
        debug!("PINO損失: u={:?}, viscosity={}", u.dims(), self.viscosity);
        let (loss_ic, loss_f) = pino_loss_3d(u, u0, forcing, self.viscosity, self.t_interval);
        PinoLossOutput {
            loss_ic,
            loss_f,
            ic_weight: self.ic_weight,
            f_weight: self.f_weight,
        }
    }
}

/// [`PinoLoss::forward`] の結果。
#[derive(Debug, Clone)]
pub struct PinoLossOutput<B: Backend> {
    pub loss_ic: Tensor<B, 1>,
    pub loss_f: Tensor<B, 1>,
    ic_weight: f64,
    f_weight: f64,
}

impl<B: Backend> PinoLossOutput<B> {
    /// 学習で最小化する重み付き和 `ic_weight·loss_ic + f_weight·loss_f`。
    pub fn total(&self) -> Tensor<B, 1> {
        self.loss_ic.clone().mul_scalar(self.ic_weight)
            + self.loss_f.clone().mul_scalar(self.f_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forcing::{kolmogorov_forcing, kolmogorov_steady_vorticity};
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn exact_initial_condition_gives_zero_ic_loss() {
        let device = Default::default();
        let u =
            Tensor::<TestBackend, 4>::random([2, 8, 8, 4], Distribution::Normal(0.0, 1.0), &device);
        let u0 = u.clone().slice([0..2, 0..8, 0..8, 0..1]).reshape([2, 8, 8]);
        let forcing = kolmogorov_forcing::<TestBackend>(8, &device);

        let (loss_ic, loss_f) =
            pino_loss_3d(u, u0, forcing, DEFAULT_VISCOSITY, DEFAULT_T_INTERVAL);
        assert_eq!(loss_ic.dims(), [1]);
        assert_eq!(loss_ic.into_scalar(), 0.0);
        assert!(loss_f.into_scalar() > 0.0);
    }

    #[test]
    fn steady_solution_drives_equation_loss_to_zero() {
        let (n, nt) = (16, 5);
        let device = Default::default();
        let u = kolmogorov_steady_vorticity::<TestBackend>(n, nt, 2, DEFAULT_VISCOSITY, &device);
        let u0 = u.clone().slice([0..2, 0..n, 0..n, 0..1]).reshape([2, n, n]);
        let forcing = kolmogorov_forcing::<TestBackend>(n, &device);

        let (_, exact) =
            pino_loss_3d(u.clone(), u0.clone(), forcing.clone(), DEFAULT_VISCOSITY, 1.0);
        let exact = exact.into_scalar();
        assert!(exact < 1e-3, "loss_f = {}", exact);

        let noise =
            Tensor::<TestBackend, 4>::random(u.dims(), Distribution::Normal(0.0, 1.0), &device);
        let (_, perturbed) = pino_loss_3d(u + noise, u0, forcing, DEFAULT_VISCOSITY, 1.0);
        assert!(perturbed.into_scalar() > exact);
    }

    #[test]
    fn weighted_total_combines_both_terms() {
        let (n, nt) = (8, 3);
        let device = Default::default();
        let normal = Distribution::Normal(0.0, 1.0);
        let u = Tensor::<TestBackend, 4>::random([1, n, n, nt], normal, &device);
        let u0 = Tensor::<TestBackend, 3>::random([1, n, n], normal, &device);
        let forcing = kolmogorov_forcing::<TestBackend>(n, &device);

        let output = PinoLossConfig::new()
            .with_ic_weight(2.0)
            .with_f_weight(0.5)
            .init()
            .forward(u, u0, forcing);
        let loss_ic = output.loss_ic.clone().into_scalar();
        let loss_f = output.loss_f.clone().into_scalar();
        let total = output.total().into_scalar();
        assert!((total - (2.0 * loss_ic + 0.5 * loss_f)).abs() < 1e-4 * total.abs().max(1.0));
    }

    #[test]
    fn config_defaults_match_reference_flow() {
        let config = PinoLossConfig::new();
        assert_eq!(config.viscosity, 1.0 / 40.0);
        assert_eq!(config.t_interval, 1.0);
    }
}
