use thiserror::Error;

/// 入力テンソルの形状や設定ファイルに関するエラー。
///
/// 損失計算そのものは形状を検証しないため、これらは呼び出し側が
/// 事前にチェックしたい場合にのみ使います。
#[derive(Error, Debug)]
pub enum PinoError {
    #[error("空間格子が正方形ではありません: nx={nx}, ny={ny}")]
    GridNotSquare { nx: usize, ny: usize },

    #[error("空間格子の解像度は偶数である必要があります: n={0}")]
    OddGrid(usize),

    #[error("中心差分には3ステップ以上の時間方向の格子が必要です: nt={0}")]
    TooFewTimeSteps(usize),

    #[error("{name} の形状が不正です: 期待値 {expected:?}, 実際 {actual:?}")]
    ShapeMismatch {
        name: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("設定エラー: {0}")]
    Config(String),
}

pub type PinoResult<T> = Result<T, PinoError>;

/// 渦度場 `[batch, nx, ny, nt]` が残差計算の前提を満たすか確認します。
pub fn check_vorticity_dims(dims: [usize; 4]) -> PinoResult<()> {
    let [_, nx, ny, nt] = dims;
    if nx != ny {
        return Err(PinoError::GridNotSquare { nx, ny });
    }
    if nx % 2 != 0 {
        return Err(PinoError::OddGrid(nx));
    }
    if nt < 3 {
        return Err(PinoError::TooFewTimeSteps(nt));
    }
    Ok(())
}

/// 予測場 `u`、初期条件 `u0`、外力 `forcing` の形状の組み合わせを確認します。
pub fn check_pino_inputs(u: [usize; 4], u0: [usize; 3], forcing: [usize; 4]) -> PinoResult<()> {
    check_vorticity_dims(u)?;
    let [batch, nx, ny, _] = u;
    if u0 != [batch, nx, ny] {
        return Err(PinoError::ShapeMismatch {
            name: "u0",
            expected: vec![batch, nx, ny],
            actual: u0.to_vec(),
        });
    }
    if forcing != [1, nx, ny, 1] {
        return Err(PinoError::ShapeMismatch {
            name: "forcing",
            expected: vec![1, nx, ny, 1],
            actual: forcing.to_vec(),
        });
    }
    Ok(())
}
