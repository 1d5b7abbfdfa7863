//! # Puzzle Module
//!
//! Daily target selection.
//!
//! The target for a date is a keyed hash of the date over the target pool,
//! so it is reproducible by the operator but not by players who lack the
//! salt. The first pick for a date is persisted and never recomputed, so
//! enabling or disabling cities later does not move past puzzles.

use crate::model::City;
use chrono::{NaiveDate, Utc};
use std::collections::BTreeSet;

/// The current calendar date in UTC. Puzzles roll over at 00:00 UTC.
#[must_use]
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Cities eligible as a daily target, in id order.
///
/// Guesses resolve a name to the lowest-id city carrying it, so a city whose
/// name is already taken by a lower id (in any province, enabled or not)
/// could never be guessed correctly. Those are left out along with disabled
/// cities.
#[must_use]
pub fn target_pool(cities: &[City]) -> Vec<City> {
    let mut ordered: Vec<&City> = cities.iter().collect();
    ordered.sort_by_key(|c| c.id);

    let mut seen = BTreeSet::new();
    let mut pool = Vec::new();
    for city in ordered {
        let first_with_name = seen.insert(city.name.trim().to_lowercase());
        if first_with_name && city.enabled {
            pool.push(city.clone());
        }
    }
    pool
}

/// Pick the target city for `date` among `cities`.
///
/// `cities` must be in a stable order; pass the output of [`target_pool`].
/// Returns `None` when the slice is empty.
#[must_use]
pub fn pick_city<'a>(salt: &str, date: NaiveDate, cities: &'a [City]) -> Option<&'a City> {
    if cities.is_empty() {
        return None;
    }

    let mut hasher = blake3::Hasher::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"\x00");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    let index = u64::from_le_bytes(prefix) % cities.len() as u64;

    cities.get(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CityId;
    use std::collections::BTreeSet;

    fn cities(n: u64) -> Vec<City> {
        (0..n)
            .map(|i| City {
                id: CityId(i),
                name: format!("City {i}"),
                province: "ON".to_string(),
                latitude: 45.0,
                longitude: -75.0,
                population: 1000 + i,
                enabled: true,
            })
            .collect()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap_or_default()
    }

    #[test]
    fn empty_pool_has_no_pick() {
        assert!(pick_city("salt", date(1), &[]).is_none());
    }

    #[test]
    fn pick_is_stable_for_a_date() {
        let pool = cities(50);
        let first = pick_city("salt", date(3), &pool).map(|c| c.id);
        let second = pick_city("salt", date(3), &pool).map(|c| c.id);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn pick_varies_across_dates_and_salts() {
        let pool = cities(50);

        let by_date: BTreeSet<_> = (1..=28)
            .filter_map(|day| pick_city("salt", date(day), &pool).map(|c| c.id))
            .collect();
        assert!(by_date.len() > 5, "only {} distinct targets", by_date.len());

        let by_salt: BTreeSet<_> = ["a", "b", "c", "d", "e", "f", "g", "h"]
            .iter()
            .filter_map(|salt| pick_city(salt, date(1), &pool).map(|c| c.id))
            .collect();
        assert!(by_salt.len() > 1);
    }

    #[test]
    fn pool_skips_disabled_and_shadowed_names() {
        let mut all = cities(4);
        all[1].enabled = false;
        all[3].name = " city 0 ".to_string();
        all[3].province = "QC".to_string();

        let ids: Vec<CityId> = target_pool(&all).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![CityId(0), CityId(2)]);
    }

    #[test]
    fn disabled_city_still_shadows_its_name() {
        let mut all = cities(2);
        all[0].enabled = false;
        all[1].name = "City 0".to_string();

        assert!(target_pool(&all).is_empty());
    }

    #[test]
    fn single_city_is_always_picked() {
        let pool = cities(1);
        assert_eq!(pick_city("x", date(9), &pool).map(|c| c.id), Some(CityId(0)));
    }
}
