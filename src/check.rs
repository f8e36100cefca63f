use crate::cli::{CheckArgs, Precision};
use crate::error::check_pino_inputs;
use crate::forcing::{kolmogorov_forcing, kolmogorov_steady_vorticity};
use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, ElementConversion, Tensor};
use std::time::Instant;

/// `check`サブコマンドを実行します。
pub fn run(args: &CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.flow.precision {
        Precision::F32 => evaluate::<NdArray<f32>>(args),
        Precision::F64 => evaluate::<NdArray<f64>>(args),
    }
}

fn evaluate<B: Backend>(args: &CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let device = Default::default();
    let flow = &args.flow;
    let config = flow.loss_config()?;
    flow.seed_backend::<B>();

    let (n, nt, batch) = (flow.resolution, flow.steps, flow.batch);
    println!(
        "PINO損失を評価します - 格子: {}x{}x{}, バッチ: {}, ν={}, 精度: {:?}",
        n, n, nt, batch, config.viscosity, flow.precision
    );
    let start = Instant::now();

    let u = kolmogorov_steady_vorticity::<B>(n, nt, batch, config.viscosity, &device);
    let u0 = u.clone().slice([0..batch, 0..n, 0..n, 0..1]).reshape([batch, n, n]);
    let u = if args.perturbation > 0.0 {
        let noise =
            Tensor::<B, 4>::random(u.dims(), Distribution::Normal(0.0, args.perturbation), &device);
        u + noise
    } else {
        u
    };
    let forcing = kolmogorov_forcing::<B>(n, &device);
    check_pino_inputs(u.dims(), u0.dims(), forcing.dims())?;

    let output = config.init().forward(u, u0, forcing);
    let loss_ic: f64 = output.loss_ic.clone().into_scalar().elem();
    let loss_f: f64 = output.loss_f.clone().into_scalar().elem();
    let total: f64 = output.total().into_scalar().elem();
    let duration = start.elapsed();

    println!("摂動の標準偏差: {}", args.perturbation);
    println!("=> 初期条件損失: {:.6e}", loss_ic);
    println!("=> 方程式損失: {:.6e}", loss_f);
    println!(
        "=> 重み付き合計 ({}·ic + {}·f): {:.6e}",
        config.ic_weight, config.f_weight, total
    );
    println!("=> 計算時間: {:.2?}", duration);

    Ok(())
}
