use crate::cli::{Precision, SweepArgs};
use crate::forcing::{kolmogorov_forcing, kolmogorov_steady_vorticity};
use crate::pino::pino_loss_3d;
use burn::backend::NdArray;
use burn::tensor::backend::Backend;
use burn::tensor::{Distribution, ElementConversion, Tensor};
use log::debug;
use plotters::prelude::*;
use std::path::Path;
use std::time::Instant;

/// `sweep`サブコマンドを実行します。
pub fn run(args: &SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    match args.flow.precision {
        Precision::F32 => sweep::<NdArray<f32>>(args),
        Precision::F64 => sweep::<NdArray<f64>>(args),
    }
}

/// `[min, max]` を対数等間隔に `points` 点で分割します。
pub fn log_amplitudes(min: f64, max: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![min];
    }
    let (lo, hi) = (min.log10(), max.log10());
    (0..points)
        .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / (points - 1) as f64))
        .collect()
}

fn sweep<B: Backend>(args: &SweepArgs) -> Result<(), Box<dyn std::error::Error>> {
    let device = Default::default();
    let flow = &args.flow;
    let config = flow.loss_config()?;
    flow.seed_backend::<B>();

    let (n, nt, batch) = (flow.resolution, flow.steps, flow.batch);
    let amplitudes = args.amplitudes()?;
    println!(
        "摂動の振幅を {} 点で掃引します - 格子: {}x{}x{}, ν={}",
        amplitudes.len(),
        n,
        n,
        nt,
        config.viscosity
    );
    let start = Instant::now();

    let u = kolmogorov_steady_vorticity::<B>(n, nt, batch, config.viscosity, &device);
    let u0 = u.clone().slice([0..batch, 0..n, 0..n, 0..1]).reshape([batch, n, n]);
    let forcing = kolmogorov_forcing::<B>(n, &device);
    // 振幅だけを変えるため、摂動の向きは固定する
    let noise = Tensor::<B, 4>::random(u.dims(), Distribution::Normal(0.0, 1.0), &device);

    let (_, baseline) = pino_loss_3d(
        u.clone(),
        u0.clone(),
        forcing.clone(),
        config.viscosity,
        config.t_interval,
    );
    let baseline: f64 = baseline.into_scalar().elem();
    println!("[定常解] 方程式損失: {:.6e}", baseline);

    let mut history = Vec::with_capacity(amplitudes.len());
    for amplitude in amplitudes {
        let perturbed = u.clone() + noise.clone().mul_scalar(amplitude);
        let (_, loss_f) = pino_loss_3d(
            perturbed,
            u0.clone(),
            forcing.clone(),
            config.viscosity,
            config.t_interval,
        );
        let loss_f: f64 = loss_f.into_scalar().elem();
        debug!("amplitude={:.3e}, loss_f={:.6e}", amplitude, loss_f);
        println!("[振幅 {:.3e}] 方程式損失: {:.6e}", amplitude, loss_f);
        history.push((amplitude, loss_f));
    }
    println!("掃引が完了しました。");
    println!("=> 計算時間: {:.2?}", start.elapsed());

    plot_loss_sweep(&history, baseline, &args.output)?;
    println!("=> 損失グラフを '{}' に保存しました。", args.output.display());

    Ok(())
}

/// 摂動の振幅に対する方程式損失を両対数グラフとしてPNGファイルに出力します。
fn plot_loss_sweep(
    history: &[(f64, f64)],
    baseline: f64,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_points: Vec<(f64, f64)> = history
        .iter()
        .map(|&(amplitude, loss)| (amplitude.log10(), loss.max(f64::MIN_POSITIVE).log10()))
        .collect();
    let log_baseline = baseline.max(1e-12).log10();

    let min_x = log_points.first().map(|p| p.0).unwrap_or(-3.0);
    let max_x = log_points.last().map(|p| p.0).unwrap_or(0.0).max(min_x + 1e-6);
    let min_y = log_points
        .iter()
        .map(|p| p.1)
        .fold(log_baseline, f64::min)
        - 0.5;
    let max_y = log_points.iter().map(|p| p.1).fold(log_baseline, f64::max) + 0.5;

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("PDE Loss vs Perturbation", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(min_x..max_x, min_y..max_y)?;
    chart
        .configure_mesh()
        .y_desc("PDE Loss (log10 scale)")
        .x_desc("Perturbation amplitude (log10 scale)")
        .draw()?;
    chart
        .draw_series(LineSeries::new(log_points.iter().copied(), &RED))?
        .label("Perturbed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart
        .draw_series(LineSeries::new(
            vec![(min_x, log_baseline), (max_x, log_baseline)],
            &BLUE,
        ))?
        .label("Steady solution")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amplitudes_are_log_spaced() {
        let amplitudes = log_amplitudes(1e-3, 1.0, 4);
        let expected = [1e-3, 1e-2, 1e-1, 1.0];
        assert_eq!(amplitudes.len(), expected.len());
        for (a, e) in amplitudes.iter().zip(expected) {
            assert!((a / e - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn single_point_sweep_uses_minimum() {
        assert_eq!(log_amplitudes(0.1, 1.0, 1), vec![0.1]);
    }
}
