use crate::error::{PinoError, PinoResult, check_vorticity_dims};
use crate::pino::PinoLossConfig;
use crate::sweep::log_amplitudes;
use crate::SWEEP_GRAPH_FILENAME;
use burn::config::Config;
use burn::tensor::backend::Backend;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::path::PathBuf;

/// clapでコマンドラインの構造を定義します。
#[derive(Parser, Debug)]
#[command(author, version, about = "PINO losses for 2D Navier-Stokes vorticity with Burn", long_about = None)]
pub struct Cli {
    /// ログレベル（未指定なら RUST_LOG、それも無ければ info）
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 実行するサブコマンドを定義します（check または sweep）。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 定常コルモゴロフ流（と摂動）に対するPINO損失を評価します
    Check(CheckArgs),
    /// 摂動の大きさを変えながら方程式損失を計算し、グラフに保存します
    Sweep(SweepArgs),
}

/// 浮動小数点の精度（バックエンド `NdArray<f32>` / `NdArray<f64>`）
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    F32,
    F64,
}

/// 格子と物理パラメータの共通オプション。
#[derive(Args, Debug, Clone)]
pub struct FlowArgs {
    /// 空間格子の解像度 N（偶数）
    #[arg(long, default_value_t = 64)]
    pub resolution: usize,
    /// 時間方向の格子点数（3以上）
    #[arg(long, default_value_t = 11)]
    pub steps: usize,
    #[arg(long, default_value_t = 1)]
    pub batch: usize,
    /// 動粘性係数（設定ファイルの値より優先）
    #[arg(long)]
    pub viscosity: Option<f64>,
    /// 時間幅（設定ファイルの値より優先）
    #[arg(long)]
    pub t_interval: Option<f64>,
    /// `PinoLossConfig` のJSONファイル
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Precision::F32)]
    pub precision: Precision,
    /// 乱数シード（未指定ならランダム）
    #[arg(long)]
    pub seed: Option<u64>,
}

impl FlowArgs {
    /// 設定ファイルとコマンドライン引数から損失の設定を組み立て、格子の形状も検証します。
    pub fn loss_config(&self) -> PinoResult<PinoLossConfig> {
        check_vorticity_dims([self.batch, self.resolution, self.resolution, self.steps])?;

        let mut config = match &self.config {
            Some(path) => PinoLossConfig::load(path)
                .map_err(|e| PinoError::Config(format!("{}: {}", path.display(), e)))?,
            None => PinoLossConfig::new(),
        };
        if let Some(viscosity) = self.viscosity {
            config.viscosity = viscosity;
        }
        if let Some(t_interval) = self.t_interval {
            config.t_interval = t_interval;
        }
        if config.viscosity <= 0.0 || config.t_interval <= 0.0 {
            return Err(PinoError::Config(format!(
                "viscosity と t_interval は正である必要があります (viscosity={}, t_interval={})",
                config.viscosity, config.t_interval
            )));
        }
        Ok(config)
    }

    /// バックエンドの乱数シードを設定し、使ったシードを返します。
    pub fn seed_backend<B: Backend>(&self) -> u64 {
        let seed = self.seed.unwrap_or_else(rand::random);
        B::seed(seed);
        info!("乱数シード: {}", seed);
        seed
    }
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub flow: FlowArgs,
    /// 定常解に加える正規乱数の標準偏差
    #[arg(long, default_value_t = 0.0)]
    pub perturbation: f64,
}

#[derive(Args, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub flow: FlowArgs,
    #[arg(long, default_value_t = 1e-3)]
    pub min_amplitude: f64,
    #[arg(long, default_value_t = 1.0)]
    pub max_amplitude: f64,
    /// 振幅の分割数（対数等間隔）
    #[arg(long, default_value_t = 12)]
    pub points: usize,
    #[arg(long, default_value = SWEEP_GRAPH_FILENAME)]
    pub output: PathBuf,
}

impl SweepArgs {
    /// 振幅の範囲を検証し、対数等間隔の振幅列を返します。
    pub fn amplitudes(&self) -> PinoResult<Vec<f64>> {
        let (min, max) = (self.min_amplitude, self.max_amplitude);
        if !(min > 0.0 && max >= min) || self.points == 0 {
            return Err(PinoError::Config(format!(
                "振幅は 0 < min <= max、点数は1以上が必要です (min={}, max={}, points={})",
                min, max, self.points
            )));
        }
        Ok(log_amplitudes(min, max, self.points))
    }
}
