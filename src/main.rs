//! # PINO損失の評価プログラム
//!
//! 2次元ナビエ–ストークス渦度方程式のPINO損失を、コルモゴロフ流の定常解とその摂動に対して
//! 評価します。学習済みモデルが無くても損失の振る舞いを確認できます。
//!
//! ## 使い方
//!
//! ### 定常解（と摂動）の損失を表示
//! ```bash
//! cargo run --release -- check --resolution 64 --steps 11 --perturbation 0.1
//! ```
//!
//! ### 摂動の振幅に対する方程式損失をグラフに保存
//! ```bash
//! cargo run --release -- sweep --min-amplitude 1e-4 --max-amplitude 1
//! ```

use clap::Parser;
use pino::cli::{Cli, Commands};
use pino::{check, logging, sweep};

/// プログラムのエントリーポイント。
///
/// コマンドライン引数を解析し、`check`または`sweep`の処理に振り分けます。
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    match &cli.command {
        Commands::Check(args) => check::run(args),
        Commands::Sweep(args) => sweep::run(args),
    }
}
