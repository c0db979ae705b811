use rand::Rng;
use rand::seq::IndexedRandom;

/// Words the random slugs are built from.
pub const THEME_WORDS: &[&str] = &[
    "nebula", "quasar", "pulsar", "comet", "orbit", "galaxy", "nova", "eclipse",
];

/// A random `"<word>-<n>"` label text with `n` in `0..1000`.
pub fn random_slug(rng: &mut impl Rng) -> String {
    let word = THEME_WORDS.choose(rng).copied().unwrap_or("nova");
    let n: u32 = rng.random_range(0..1000);
    format!("{word}-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn slug_has_theme_word_and_number() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let slug = random_slug(&mut rng);
            let (word, n) = slug.rsplit_once('-').unwrap();
            assert!(THEME_WORDS.contains(&word), "{slug}");
            assert!(n.parse::<u32>().unwrap() < 1000);
        }
    }

    #[test]
    fn seeded_slugs_repeat() {
        let a = random_slug(&mut StdRng::seed_from_u64(9));
        let b = random_slug(&mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
