//! Supply-driven market prices.
use std::collections::BTreeMap;

use crate::config::PricingConfig;
use crate::constants::{
    INFLATION_BOUND, KPI_INFLATION_RATE, KPI_MARKET_VOLATILITY, KPI_RESOURCE_PRICES,
    SUPPLY_FACTOR_MAX, SUPPLY_FACTOR_MIN,
};
use crate::numbers::{i64_to_f64, mean, round_to};
use crate::pipeline::{StageCtx, Tick};
use crate::rng::StepRng;
use crate::state::Resources;
use crate::tables::BASE_PRICES;

/// Scarcity multiplier: below the reference stock prices rise, above it they fall.
#[must_use]
pub fn supply_factor(stock: i64, cfg: &PricingConfig) -> f64 {
    (cfg.reference_stock / i64_to_f64(stock).max(1.0)).clamp(SUPPLY_FACTOR_MIN, SUPPLY_FACTOR_MAX)
}

fn quote(base: f64, stock: i64, rng: &mut StepRng, cfg: &PricingConfig) -> f64 {
    let volatility = rng.jitter(cfg.volatility);
    let price = (base * supply_factor(stock, cfg) * volatility).clamp(cfg.price_min, cfg.price_max);
    round_to(price, 2)
}

/// Price every base resource, one draw each, and record market KPIs.
pub fn reduce(mut tick: Tick, ctx: &mut StageCtx<'_>) -> Tick {
    let cfg = &ctx.cfg.pricing;
    let (prices, deviations) = price_market(&tick.state.resources, ctx.rng, cfg);

    let volatility = mean(&deviations.iter().map(|d| d.abs()).collect::<Vec<_>>());
    let inflation = mean(&deviations).clamp(-INFLATION_BOUND, INFLATION_BOUND);

    let kpis = &mut tick.state.kpis;
    kpis.set_prices(KPI_RESOURCE_PRICES, prices);
    kpis.set_number(KPI_MARKET_VOLATILITY, volatility);
    kpis.set_number(KPI_INFLATION_RATE, inflation);
    tick
}

fn price_market(
    resources: &Resources,
    rng: &mut StepRng,
    cfg: &PricingConfig,
) -> (BTreeMap<String, f64>, Vec<f64>) {
    let mut prices = BTreeMap::new();
    let mut deviations = Vec::with_capacity(BASE_PRICES.len());
    for (resource, base) in BASE_PRICES {
        let price = quote(base, resources.get(resource), rng, cfg);
        deviations.push((price - base) / base);
        prices.insert(resource.to_string(), price);
    }
    (prices, deviations)
}
