//! # 2次元ナビエ–ストークス渦度方程式のPINO損失ライブラリ
//!
//! `burn` フレームワーク上で、物理情報ニューラルオペレータ（PINO）の学習に使う
//! 損失関数を提供します。
//!
//! * [`loss::LpLoss`] - バッチ化された場の絶対・相対 Lp 誤差
//! * [`forcing::kolmogorov_forcing`] - コルモゴロフ流の定常外力
//! * [`vorticity::fdm_ns_vorticity`] - スペクトル微分による渦度方程式の残差
//! * [`pino::pino_loss_3d`] - 初期条件損失と方程式損失の組
//!
//! すべてバックエンド `B` に対してジェネリックなので、精度やデバイスは
//! 呼び出し側のバックエンドの選択で決まり、`Autodiff` 上では勾配も計算できます。

pub mod check;
pub mod cli;
pub mod error;
pub mod forcing;
pub mod logging;
pub mod loss;
pub mod pino;
pub mod spectral;
pub mod sweep;
pub mod vorticity;

/// 既定の動粘性係数 ν = 1/40
pub const DEFAULT_VISCOSITY: f64 = 1.0 / 40.0;

/// 既定の時間幅
pub const DEFAULT_T_INTERVAL: f64 = 1.0;

/// `sweep` サブコマンドが出力するグラフのファイル名
pub const SWEEP_GRAPH_FILENAME: &str = "loss_sweep.png";
