use statrs::statistics::Statistics;

//simple moving average of the whole slice
pub fn sma(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

//average of the trailing `period` prices
pub fn sma_last(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    sma(&prices[prices.len() - period..])
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub lower: f64,
    pub mid: f64,
    pub upper: f64,
}

//bollinger bands over the trailing `period` closes, population std dev
pub fn bollinger(closes: &[f64], period: usize, devfactor: f64) -> Option<Bands> {
    if period == 0 || closes.len() < period {
        return None;
    }

    let window = &closes[closes.len() - period..];
    let mid = window.mean();
    let dev = window.population_std_dev() * devfactor;

    Some(Bands {
        lower: mid - dev,
        mid,
        upper: mid + dev,
    })
}

//1-based ranks, ties share the average rank
fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

//spearman rank correlation; NaN when either side is constant or lengths differ
pub fn spearman(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return f64::NAN;
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return f64::NAN;
    }

    let rx = ranks(xs);
    let ry = ranks(ys);

    let sx = (&rx).std_dev();
    let sy = (&ry).std_dev();
    if sx == 0.0 || sy == 0.0 {
        return f64::NAN;
    }

    (&rx).covariance(&ry) / (sx * sy)
}

//rank correlation between the lookbacks and their moving averages
//-1 when longer averages sit lower (a rising shape), +1 when they sit higher
pub fn trend_strength(closes: &[f64], lookbacks: &[usize]) -> Option<f64> {
    let longest = lookbacks.iter().copied().max()?;
    if closes.len() < longest + 1 {
        return None;
    }

    let averages: Vec<f64> = lookbacks
        .iter()
        .map(|&n| sma_last(closes, n))
        .collect::<Option<_>>()?;
    let lengths: Vec<f64> = lookbacks.iter().map(|&n| n as f64).collect();

    Some(spearman(&lengths, &averages))
}
