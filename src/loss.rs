use burn::config::Config;
use burn::tensor::Tensor;
use burn::tensor::backend::Backend;

/// [`LpLoss`] の設定。
#[derive(Config, Debug)]
pub struct LpLossConfig {
    /// 空間次元。メッシュ幅による正規化 `h^(d/p)` に使います。
    #[config(default = 2)]
    pub d: usize,
    /// ノルムの次数 `p`
    #[config(default = 2.0)]
    pub p: f64,
    /// バッチ方向を平均するか（`false` なら総和）
    #[config(default = true)]
    pub size_average: bool,
    /// バッチ方向に集約するか（`false` ならサンプルごとのベクトルを返す）
    #[config(default = true)]
    pub reduction: bool,
}

impl LpLossConfig {
    /// 損失関数を構築します。
    ///
    /// # Panics
    ///
    /// `d` または `p` が正でない場合。
    pub fn init(&self) -> LpLoss {
        assert!(
            self.d > 0 && self.p > 0.0,
            "LpLossの次元とノルムの次数は正である必要があります (d={}, p={})",
            self.d,
            self.p
        );
        LpLoss {
            d: self.d,
            p: self.p,
            size_average: self.size_average,
            reduction: self.reduction,
        }
    }
}

/// バッチ化された場の絶対・相対 Lp 誤差。
///
/// 先頭の軸をバッチとみなし、残りの軸はすべて平坦化してノルムを取ります。
#[derive(Debug, Clone)]
pub struct LpLoss {
    d: usize,
    p: f64,
    size_average: bool,
    reduction: bool,
}

impl Default for LpLoss {
    fn default() -> Self {
        LpLossConfig::new().init()
    }
}

impl LpLoss {
    /// 絶対誤差 `h^(d/p)·||x - y||_p`。
    ///
    /// `[0, 1]` 上の一様メッシュを仮定し、`h = 1 / (x.dims()[1] - 1)` として
    /// 連続な Lp ノルムを近似します。
    pub fn abs<B: Backend, const D: usize>(
        &self,
        x: Tensor<B, D>,
        y: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let h = 1.0 / (x.dims()[1] as f64 - 1.0);
        let all_norms = batch_norm(flatten_batch(x) - flatten_batch(y), self.p)
            .mul_scalar(h.powf(self.d as f64 / self.p));
        self.reduce(all_norms)
    }

    /// 相対誤差 `||x - y||_p / ||y||_p`。
    ///
    /// 参照 `y` のノルムが0のサンプルがあると結果は有限になりません。
    pub fn rel<B: Backend, const D: usize>(
        &self,
        x: Tensor<B, D>,
        y: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        let y = flatten_batch(y);
        let diff_norms = batch_norm(flatten_batch(x) - y.clone(), self.p);
        let y_norms = batch_norm(y, self.p);
        self.reduce(diff_norms / y_norms)
    }

    /// [`LpLoss::rel`] と同じです。
    pub fn forward<B: Backend, const D: usize>(
        &self,
        x: Tensor<B, D>,
        y: Tensor<B, D>,
    ) -> Tensor<B, 1> {
        self.rel(x, y)
    }

    fn reduce<B: Backend>(&self, all_norms: Tensor<B, 1>) -> Tensor<B, 1> {
        match (self.reduction, self.size_average) {
            (true, true) => all_norms.mean(),
            (true, false) => all_norms.sum(),
            (false, _) => all_norms,
        }
    }
}

fn flatten_batch<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, 2> {
    let num_examples = x.dims()[0];
    let numel = x.shape().num_elements();
    x.reshape([num_examples, numel / num_examples])
}

/// サンプルごとの Lp ノルム `[batch]`
///
/// ノルムが0のサンプルは `1^(1/p)` を通してから0で埋めるので、勾配は0になります。
fn batch_norm<B: Backend>(x: Tensor<B, 2>, p: f64) -> Tensor<B, 1> {
    let num_examples = x.dims()[0];
    let sum = x.abs().powf_scalar(p).sum_dim(1);
    let zero = sum.clone().equal_elem(0.0);
    sum.mask_fill(zero.clone(), 1.0)
        .powf_scalar(1.0 / p)
        .mask_fill(zero, 0.0)
        .reshape([num_examples])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, TensorData};

    type TestBackend = NdArray<f32>;

    fn tensor2(values: Vec<f32>, shape: [usize; 2]) -> Tensor<TestBackend, 2> {
        Tensor::from_data(TensorData::new(values, shape), &Default::default())
    }

    #[test]
    fn rel_of_identical_fields_is_zero() {
        let x = Tensor::<TestBackend, 4>::random(
            [3, 8, 8, 4],
            Distribution::Normal(0.0, 1.0),
            &Default::default(),
        );
        let loss = LpLoss::default().rel(x.clone(), x).into_scalar();
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn rel_matches_hand_computed_value() {
        // ||(3, -4)|| / ||(0, 4)|| = 5 / 4
        let x = tensor2(vec![3.0, 0.0], [1, 2]);
        let y = tensor2(vec![0.0, 4.0], [1, 2]);
        let loss = LpLoss::default().forward(x, y).into_scalar();
        assert!((loss - 1.25).abs() < 1e-6);
    }

    #[test]
    fn reduction_policy() {
        let x = tensor2(vec![3.0, 0.0, 1.0, 1.0], [2, 2]);
        let y = tensor2(vec![0.0, 4.0, 1.0, 1.0], [2, 2]);

        let per_example = LpLossConfig::new()
            .with_reduction(false)
            .init()
            .rel(x.clone(), y.clone());
        assert_eq!(per_example.dims(), [2]);
        let values = per_example.into_data().to_vec::<f32>().unwrap();
        assert!((values[0] - 1.25).abs() < 1e-6);
        assert_eq!(values[1], 0.0);

        let mean = LpLoss::default().rel(x.clone(), y.clone()).into_scalar();
        assert!((mean - 0.625).abs() < 1e-6);

        let sum = LpLossConfig::new()
            .with_size_average(false)
            .init()
            .rel(x, y)
            .into_scalar();
        assert!((sum - 1.25).abs() < 1e-6);
    }

    #[test]
    fn abs_scales_with_mesh_width() {
        let loss = LpLoss::default();
        let abs_for = |n: usize| {
            let mut values = vec![0.0; n];
            values[0] = 1.0;
            loss.abs(tensor2(values, [1, n]), tensor2(vec![0.0; n], [1, n]))
                .into_scalar()
        };

        // d/p = 1 なので h がそのまま掛かる
        assert!((abs_for(5) - 0.25).abs() < 1e-6);
        let ratio = abs_for(9) / abs_for(5);
        assert!((ratio - 4.0 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn abs_uses_general_p() {
        let loss = LpLossConfig::new().with_p(1.0).with_d(1).init();
        let x = tensor2(vec![1.0, -2.0, 3.0], [1, 3]);
        let y = tensor2(vec![0.0; 3], [1, 3]);
        // h = 1/2, ||x||_1 = 6
        assert!((loss.abs(x, y).into_scalar() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_difference_keeps_norm_zero() {
        let x = tensor2(vec![1.0, 2.0, 3.0, 4.0], [2, 2]);
        let y = tensor2(vec![1.0, 2.0, 0.0, 4.0], [2, 2]);
        let values = LpLossConfig::new()
            .with_reduction(false)
            .init()
            .rel(x, y)
            .into_data()
            .to_vec::<f32>()
            .unwrap();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 0.75).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn non_positive_order_is_rejected() {
        LpLossConfig::new().with_p(0.0).init();
    }

    #[test]
    #[should_panic]
    fn zero_dimension_is_rejected() {
        LpLossConfig::new().with_d(0).init();
    }
}
