use std::cmp::Ordering;

use ndarray::Array1;
use num_traits::Float;

use crate::lines::LineTable;
use crate::region::Region;

/// Indices of the `count` most intense lines of `lines` inside `region`
///
/// Candidates are ranked by `intensities` with a stable sort, so of two equally intense lines the
/// one later in the table wins the last remaining place. Lines whose intensity is undefined, such as
/// a line at zero wavenumber, are never selected. The kept indices are returned ordered by ascending
/// wavenumber. Regions holding fewer than `count` lines return all of them.
///
/// # Panics
/// If `intensities` is shorter than `lines`.
pub fn select_strongest<E: Float>(
    lines: &LineTable<E>,
    intensities: &Array1<E>,
    region: &Region<E>,
    count: usize,
) -> Vec<usize> {
    let wavenumber = lines.wavenumber();

    let mut candidates = (0..lines.len())
        .filter(|&ii| region.contains(wavenumber[ii]) && !intensities[ii].is_nan())
        .collect::<Vec<_>>();
    candidates.sort_by(|&a, &b| compare(intensities[a], intensities[b]));

    let mut kept = candidates.split_off(candidates.len().saturating_sub(count));
    kept.sort_by(|&a, &b| compare(wavenumber[a], wavenumber[b]));
    kept
}

// Only called on values already known not to be NaN
fn compare<E: Float>(a: E, b: E) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use ndarray_rand::rand::{Rng, SeedableRng};
    use rand_isaac::Isaac64Rng;

    use super::select_strongest;
    use crate::lines::LineTable;
    use crate::region::Region;

    fn lines() -> LineTable<f64> {
        LineTable::new(
            arr1(&[7446.0, 7444.0, 7445.0, 7190.0, 7447.0, 7443.0]),
            arr1(&[1.0; 6]),
            arr1(&[0.0; 6]),
        )
        .unwrap()
    }

    const REGION: Region<f64> = Region {
        low: 7443.5,
        high: 7447.0,
    };

    #[test]
    fn strongest_lines_are_kept_in_wavenumber_order() {
        let intensities = arr1(&[5.0, 1.0, 3.0, 100.0, 4.0, 50.0]);

        let kept = select_strongest(&lines(), &intensities, &REGION, 3);

        // 7190 and 7443 lie outside the region; 7444 is the weakest inside
        assert_eq!(kept, vec![2, 0, 4]);
    }

    #[test]
    fn sparse_regions_return_every_line() {
        let intensities = arr1(&[5.0, 1.0, 3.0, 100.0, 4.0, 50.0]);

        let kept = select_strongest(&lines(), &intensities, &REGION, 10);

        assert_eq!(kept, vec![1, 2, 0, 4]);
    }

    #[test]
    fn empty_regions_return_nothing() {
        let intensities = arr1(&[5.0, 1.0, 3.0, 100.0, 4.0, 50.0]);
        let region = Region {
            low: 8000.0,
            high: 8100.0,
        };

        assert!(select_strongest(&lines(), &intensities, &region, 3).is_empty());
    }

    #[test]
    fn ties_favour_later_lines() {
        let intensities = arr1(&[2.0, 2.0, 2.0, 2.0, 2.0, 2.0]);

        let kept = select_strongest(&lines(), &intensities, &REGION, 2);

        // Candidates in table order are rows 0, 1, 2, 4
        assert_eq!(kept, vec![2, 4]);
    }

    #[test]
    fn undefined_intensities_are_never_selected() {
        let seed = 40;
        let mut rng = Isaac64Rng::seed_from_u64(seed);

        let num_lines = 64;
        let wavenumber = (0..num_lines)
            .map(|ii| {
                if ii % 3 == 0 {
                    0.0
                } else {
                    rng.gen_range(7000.0..7500.0)
                }
            })
            .collect::<Vec<f64>>();
        let intensities = wavenumber
            .iter()
            .map(|&nu| if nu == 0.0 { f64::NAN } else { rng.gen_range(0.0..1.0) })
            .collect::<Vec<f64>>();
        let lines = LineTable::new(
            arr1(&wavenumber),
            arr1(&vec![1.0; num_lines]),
            arr1(&vec![0.0; num_lines]),
        )
        .unwrap();
        let region = Region {
            low: 0.0,
            high: 1e5,
        };

        let kept = select_strongest(&lines, &arr1(&intensities), &region, 50);

        // Every defined line fits within the count, and none of the undefined ones is kept
        let defined = intensities.iter().filter(|intensity| !intensity.is_nan()).count();
        assert_eq!(kept.len(), defined);
        assert!(kept.iter().all(|&ii| !intensities[ii].is_nan()));
        assert!(kept.windows(2).all(|pair| wavenumber[pair[0]] <= wavenumber[pair[1]]));
    }
}
