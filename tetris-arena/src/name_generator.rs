//! Pronounceable display names for players who don't choose one

use markov_namegen::{CharacterChainGenerator, RandomTextGenerator};

/// Longest generated base name
const MAX_NAME_LEN: usize = 10;

/// Training corpus: stars, constellations and arcade-flavoured words
const TRAINING_NAMES: &[&str] = &[
    "Altair", "Vega", "Rigel", "Sirius", "Deneb", "Antares", "Castor", "Pollux",
    "Mira", "Electra", "Maia", "Alcor", "Mizar", "Capella", "Arcturus", "Spica",
    "Lyra", "Draco", "Cygnus", "Orion", "Perseus", "Cassio", "Andromeda", "Hydra",
    "Pixel", "Blitz", "Turbo", "Combo", "Quad", "Zenith", "Vortex", "Nova",
    "Comet", "Quasar", "Pulsar", "Nebula", "Photon", "Rocket", "Laser", "Glitch",
];

fn create_name_generator() -> CharacterChainGenerator {
    CharacterChainGenerator::builder()
        .with_order(2)
        .with_prior(0.01)
        .train(TRAINING_NAMES.iter().copied())
        .build()
}

/// Generate a short alphanumeric name such as "Polaxa" or "Spiro"
pub fn generate_name() -> String {
    let mut generator = create_name_generator();
    loop {
        let name = generator.generate_one();
        if !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return name;
        }
    }
}

/// Generate a name with a numeric suffix, usable both as display name
/// and as player id (e.g. "Vegar_417")
pub fn generate_player_name() -> String {
    let suffix = rand::random::<u16>() % 1000;
    format!("{}_{}", generate_name(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlayerId;

    #[test]
    fn test_generate_name() {
        let name = generate_name();
        assert!(!name.is_empty());
        assert!(name.len() <= MAX_NAME_LEN);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_player_name_is_a_valid_id() {
        let name = generate_player_name();
        let (base, suffix) = name.split_once('_').unwrap();
        assert!(!base.is_empty());
        assert!(suffix.parse::<u16>().unwrap() < 1000);
        assert!(PlayerId::from_name(name).is_ok());
    }

    #[test]
    fn test_names_vary() {
        let names: std::collections::HashSet<String> =
            (0..10).map(|_| generate_player_name()).collect();
        assert!(names.len() > 5);
    }
}
