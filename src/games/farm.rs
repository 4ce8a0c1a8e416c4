//! Farm rules: land prices, harvest yields and the growing summary
//!
//! Land is bought plot by plot up to [`MAX_PLOTS`], each plot priced by the
//! tier it falls in. Plots themselves live in the farm store.

use rand::Rng;

use super::items::{self, Growth};
use crate::services::Plot;

pub const MAX_PLOTS: usize = 80;

/// Upper plot bound (exclusive) and price per plot of each tier
const PRICE_TIERS: [(usize, i64); 4] = [(8, 50_000), (24, 100_000), (48, 250_000), (MAX_PLOTS, 500_000)];

/// Plots planted within this many milliseconds of each other are listed together
const PATCH_WINDOW_MS: i64 = 1_000;

/// Price of the plot at zero-based `index`
pub fn plot_price(index: usize) -> i64 {
    PRICE_TIERS
        .iter()
        .find(|(bound, _)| index < *bound)
        .map_or(i64::MAX, |(_, price)| *price)
}

/// How many of `requested` plots can still be bought next to `owned` ones
pub fn expansion_size(owned: usize, requested: usize) -> usize {
    requested.min(MAX_PLOTS.saturating_sub(owned))
}

/// Total price of `amount` plots after the `owned` ones
pub fn expansion_price(owned: usize, amount: usize) -> i64 {
    (owned..owned + amount).map(plot_price).sum()
}

pub fn growth_ms(growth: &Growth) -> i64 {
    growth.time.as_millis() as i64
}

/// Produce harvested from `plots` ripe plots
pub fn roll_yield<R: Rng + ?Sized>(growth: &Growth, plots: usize, rng: &mut R) -> i64 {
    (0..plots).map(|_| rng.random_range(growth.min..=growth.max)).sum()
}

/// A run of neighbouring plots with the same crop, ripening together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub crop: String,
    pub ready_at: i64,
    pub count: usize,
}

pub fn patches(plots: &[Plot]) -> Vec<Patch> {
    let mut out: Vec<Patch> = Vec::new();
    for plot in plots {
        let Some(crop) = &plot.crop else {
            continue;
        };
        let grow = items::item(crop).and_then(|i| i.growth).map_or(0, |g| growth_ms(&g));
        let ready_at = plot.planted_at + grow;
        match out.last_mut() {
            Some(last) if last.crop == *crop && (last.ready_at - ready_at).abs() < PATCH_WINDOW_MS => {
                last.count += 1;
            }
            _ => out.push(Patch {
                crop: crop.clone(),
                ready_at,
                count: 1,
            }),
        }
    }
    out
}

/// One `Name (xN) <t:…:R>` line per patch
pub fn describe_patches(patches: &[Patch]) -> String {
    patches
        .iter()
        .map(|p| {
            format!(
                "{} (x{}) <t:{}:R>",
                items::name_of(&p.crop),
                p.count,
                p.ready_at.div_euclid(1_000)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn planted(crop: &str, at: i64) -> Plot {
        Plot {
            crop: Some(crop.to_string()),
            planted_at: at,
        }
    }

    #[test]
    fn test_prices_follow_the_tiers() {
        assert_eq!(plot_price(0), 50_000);
        assert_eq!(plot_price(8), 100_000);
        assert_eq!(plot_price(47), 250_000);
        assert_eq!(plot_price(79), 500_000);
        assert_eq!(expansion_price(6, 4), 2 * 50_000 + 2 * 100_000);
        assert_eq!(expansion_price(0, 0), 0);
    }

    #[test]
    fn test_expansion_stops_at_the_limit() {
        assert_eq!(expansion_size(0, 3), 3);
        assert_eq!(expansion_size(78, 5), 2);
        assert_eq!(expansion_size(MAX_PLOTS, 1), 0);
    }

    #[test]
    fn test_yield_stays_in_range() {
        let growth = items::item("potato").unwrap().growth.unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let total = roll_yield(&growth, 3, &mut rng);
            assert!((6..=12).contains(&total), "total {total}");
        }
        assert_eq!(roll_yield(&growth, 0, &mut rng), 0);
    }

    #[test]
    fn test_patches_group_neighbours() {
        let plots = vec![
            planted("wheat_seeds", 0),
            planted("wheat_seeds", 500),
            Plot::default(),
            planted("wheat_seeds", 60_000),
            planted("potato", 60_000),
        ];
        let grouped = patches(&plots);
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].count, 2);
        assert_eq!(grouped[0].ready_at, 15 * 60 * 1_000);
        assert_eq!(
            describe_patches(&grouped[..1]),
            "Wheat Seeds (x2) <t:900:R>"
        );
    }
}
