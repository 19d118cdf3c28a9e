use std::collections::HashMap;

use crate::models::{Chick, DietShare};

/// Converts per-chick peak incomes into percentage shares per diet group.
///
/// Groups follow first-sighting order of the diet ids so the output order is
/// stable across runs. Each group contributes the mean of its members' peak
/// incomes; shares are rounded independently against the sum of the means.
/// A zero or non-finite total (every peak income zero, or no baselines at
/// all) would leave every share undefined, so such shares fall back to an
/// even split.
pub fn diet_shares(chicks: &[Chick]) -> Vec<DietShare> {
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<f64>> = HashMap::new();

    for chick in chicks {
        if !groups.contains_key(&chick.diet_id) {
            order.push(chick.diet_id);
        }
        groups.entry(chick.diet_id).or_default().push(chick.max_income);
    }

    let mut total = 0.0;
    let mut means: Vec<(i64, f64)> = Vec::with_capacity(order.len());

    for diet_id in order {
        let incomes = &groups[&diet_id];
        let mean = incomes.iter().sum::<f64>() / incomes.len() as f64;
        total += mean;
        means.push((diet_id, mean));
    }

    let group_count = means.len() as f64;
    means
        .into_iter()
        .map(|(diet_id, mean)| {
            let share = mean * 100.0 / total;
            DietShare {
                diet_id,
                percent: if share.is_finite() {
                    share.round() as i64
                } else {
                    (100.0 / group_count).round() as i64
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chick_with_income(id: i64, diet_id: i64, max_income: f64) -> Chick {
        let mut chick = Chick::new(id, diet_id);
        chick.absorb_income(max_income);
        chick
    }

    #[test]
    fn single_diet_takes_the_whole_pie() {
        let chicks = vec![chick_with_income(1, 1, 30.0)];
        let shares = diet_shares(&chicks);

        assert_eq!(shares, vec![DietShare { diet_id: 1, percent: 100 }]);
    }

    #[test]
    fn one_share_per_distinct_diet_in_sighting_order() {
        let chicks = vec![
            chick_with_income(1, 2, 10.0),
            chick_with_income(2, 1, 20.0),
            chick_with_income(3, 2, 30.0),
        ];
        let shares = diet_shares(&chicks);

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].diet_id, 2);
        assert_eq!(shares[1].diet_id, 1);
    }

    #[test]
    fn shares_are_mean_based_and_rounded() {
        // Diet 1 mean = 20, diet 2 mean = 60, total 80.
        let chicks = vec![
            chick_with_income(1, 1, 10.0),
            chick_with_income(2, 1, 30.0),
            chick_with_income(3, 2, 60.0),
        ];
        let shares = diet_shares(&chicks);

        assert_eq!(shares[0].percent, 25);
        assert_eq!(shares[1].percent, 75);
    }

    #[test]
    fn rounding_is_independent_per_group() {
        // Means 1, 1, 1: each share rounds to 33, summing to 99.
        let chicks = vec![
            chick_with_income(1, 1, 1.0),
            chick_with_income(2, 2, 1.0),
            chick_with_income(3, 3, 1.0),
        ];
        let shares = diet_shares(&chicks);

        let sum: i64 = shares.iter().map(|share| share.percent).sum();
        assert_eq!(sum, 99);
        assert!(shares.iter().all(|share| share.percent == 33));
    }

    #[test]
    fn zero_total_income_splits_evenly() {
        // A lone baseline record has income 0; the single diet still owns
        // the whole pie.
        let chicks = vec![chick_with_income(1, 1, 0.0)];
        assert_eq!(diet_shares(&chicks), vec![DietShare { diet_id: 1, percent: 100 }]);

        let chicks = vec![chick_with_income(1, 1, 0.0), chick_with_income(2, 2, 0.0)];
        let shares = diet_shares(&chicks);
        assert!(shares.iter().all(|share| share.percent == 50));
    }

    #[test]
    fn no_chicks_mean_no_shares() {
        assert!(diet_shares(&[]).is_empty());
    }
}
