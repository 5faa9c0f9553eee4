//! Rhythm primitives
//!
//! Euclidean step masks and groove (velocity humanisation) functions that
//! the pattern and groove catalogs resolve to.

use rand::{Rng, RngCore};

/// Distribute `pulses` onsets as evenly as possible over `steps` steps.
///
/// Follows Bjorklund's grouping algorithm, so `(3, 8)` yields `x..x..x.`.
/// Pulses beyond `steps` are clamped.
pub fn bjorklund(pulses: u32, steps: u32) -> Vec<bool> {
    let steps = steps as usize;
    let pulses = (pulses as usize).min(steps);

    let mut heads: Vec<Vec<bool>> = vec![vec![true]; pulses];
    let mut tails: Vec<Vec<bool>> = vec![vec![false]; steps - pulses];
    let (mut i, mut j) = (pulses, steps - pulses);

    while i.min(j) > 1 {
        if i > j {
            let rest = heads.split_off(j);
            heads = concat_pairs(heads, tails);
            tails = rest;
            (i, j) = (j, i - j);
        } else {
            let rest = tails.split_off(i);
            heads = concat_pairs(heads, tails);
            tails = rest;
            j -= i;
        }
    }

    heads.into_iter().chain(tails).flatten().collect()
}

fn concat_pairs(heads: Vec<Vec<bool>>, tails: Vec<Vec<bool>>) -> Vec<Vec<bool>> {
    heads
        .into_iter()
        .zip(tails)
        .map(|(mut head, tail)| {
            head.extend(tail);
            head
        })
        .collect()
}

/// Whether beat `j` is active in a step mask; the mask repeats.
pub fn is_active(mask: &[bool], j: usize) -> bool {
    !mask.is_empty() && mask[j % mask.len()]
}

// Groove functions map (rng, beat) to a velocity in [0, 1].

pub fn straight(rng: &mut dyn RngCore, _beat: usize) -> f64 {
    rng.gen_range(0.9..=1.0)
}

pub fn swing(rng: &mut dyn RngCore, beat: usize) -> f64 {
    if beat % 2 == 0 {
        rng.gen_range(0.85..=1.0)
    } else {
        rng.gen_range(0.5..=0.7)
    }
}

pub fn shuffle(rng: &mut dyn RngCore, beat: usize) -> f64 {
    match beat % 3 {
        0 => rng.gen_range(0.9..=1.0),
        1 => rng.gen_range(0.4..=0.6),
        _ => rng.gen_range(0.6..=0.8),
    }
}

pub fn push(rng: &mut dyn RngCore, beat: usize) -> f64 {
    if beat % 4 == 3 {
        rng.gen_range(0.9..=1.0)
    } else {
        rng.gen_range(0.6..=0.85)
    }
}

pub fn laidback(rng: &mut dyn RngCore, beat: usize) -> f64 {
    let decay = 1.0 - 0.1 * (beat % 4) as f64;
    (decay * rng.gen_range(0.85..=1.0)).clamp(0.0, 1.0)
}

pub fn ghost(rng: &mut dyn RngCore, beat: usize) -> f64 {
    if beat % 4 == 0 {
        rng.gen_range(0.85..=1.0)
    } else {
        rng.gen_range(0.15..=0.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn render(mask: &[bool]) -> String {
        mask.iter().map(|&on| if on { 'x' } else { '.' }).collect()
    }

    #[test]
    fn test_bjorklund_known_patterns() {
        assert_eq!(render(&bjorklund(3, 8)), "x..x..x.");
        assert_eq!(render(&bjorklund(2, 5)), "x.x..");
        assert_eq!(render(&bjorklund(4, 4)), "xxxx");
        assert_eq!(render(&bjorklund(0, 4)), "....");
    }

    #[test]
    fn test_bjorklund_preserves_counts() {
        for steps in 1..=24u32 {
            for pulses in 0..=steps {
                let mask = bjorklund(pulses, steps);
                assert_eq!(mask.len(), steps as usize);
                assert_eq!(mask.iter().filter(|&&on| on).count(), pulses as usize);
            }
        }
    }

    #[test]
    fn test_is_active_wraps() {
        let mask = bjorklund(1, 4);
        assert!(is_active(&mask, 0));
        assert!(!is_active(&mask, 1));
        assert!(is_active(&mask, 4));
        assert!(!is_active(&[], 0));
    }

    #[test]
    fn test_grooves_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let grooves: [fn(&mut dyn RngCore, usize) -> f64; 6] =
            [straight, swing, shuffle, push, laidback, ghost];
        for groove in grooves {
            for beat in 0..32 {
                let v = groove(&mut rng, beat);
                assert!((0.0..=1.0).contains(&v), "velocity {} out of range", v);
            }
        }
    }
}
