//! Session-scoped seeds for the background and logo distortion.
//!
//! Seeds live behind a [`SeedBackend`] so the shell decides where they are
//! persisted. A backend that fails to read or write never stops the engine:
//! the store keeps its own copy and the seed simply lasts for this load only.

use std::collections::HashMap;

use anyhow::Result;
use rand::prelude::*;

/// Seeds are drawn uniformly from `0..SEED_RANGE`.
pub const SEED_RANGE: u32 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeedKey {
    Background,
    Logo,
}

impl SeedKey {
    /// Key under which the seed is persisted, serialised as decimal text.
    pub fn storage_key(self) -> &'static str {
        match self {
            SeedKey::Background => "background_seed",
            SeedKey::Logo => "logo_seed",
        }
    }

    fn index(self) -> usize {
        match self {
            SeedKey::Background => 0,
            SeedKey::Logo => 1,
        }
    }
}

/// String key-value persistence used for seeds.
pub trait SeedBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Backend that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
}

impl SeedBackend for MemoryBackend {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedPair {
    pub background: u32,
    pub logo: u32,
}

pub struct SeedStore {
    backend: Box<dyn SeedBackend>,
    cached: [Option<u32>; 2],
    rng: StdRng,
}

impl SeedStore {
    pub fn new(backend: Box<dyn SeedBackend>) -> Self {
        Self::with_rng(backend, StdRng::from_entropy())
    }

    pub fn ephemeral() -> Self {
        Self::new(Box::new(MemoryBackend::default()))
    }

    pub fn with_rng(backend: Box<dyn SeedBackend>, rng: StdRng) -> Self {
        Self {
            backend,
            cached: [None, None],
            rng,
        }
    }

    /// Returns the persisted seed, generating and storing one when absent.
    pub fn get_or_create(&mut self, key: SeedKey) -> u32 {
        if let Some(seed) = self.cached[key.index()] {
            return seed;
        }
        let stored = self
            .backend
            .get(key.storage_key())
            .and_then(|raw| parse_seed(&raw));
        match stored {
            Some(seed) => {
                self.cached[key.index()] = Some(seed);
                seed
            }
            None => self.reseed(key),
        }
    }

    /// Draws a fresh seed regardless of what was stored before.
    pub fn reseed(&mut self, key: SeedKey) -> u32 {
        let seed = self.rng.gen_range(0..SEED_RANGE);
        self.cached[key.index()] = Some(seed);
        if let Err(err) = self.backend.set(key.storage_key(), &seed.to_string()) {
            tracing::warn!(
                key = key.storage_key(),
                error = %err,
                "failed to persist seed; keeping it for this run only"
            );
        }
        seed
    }

    pub fn pair(&mut self) -> SeedPair {
        SeedPair {
            background: self.get_or_create(SeedKey::Background),
            logo: self.get_or_create(SeedKey::Logo),
        }
    }
}

fn parse_seed(raw: &str) -> Option<u32> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|seed| *seed < SEED_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBackend {
        values: Rc<RefCell<HashMap<String, String>>>,
    }

    impl SeedBackend for SharedBackend {
        fn get(&self, key: &str) -> Option<String> {
            self.values.borrow().get(key).cloned()
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.values
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenBackend;

    impl SeedBackend for BrokenBackend {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("storage disabled"))
        }
    }

    fn store(backend: impl SeedBackend + 'static, seed: u64) -> SeedStore {
        SeedStore::with_rng(Box::new(backend), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn get_or_create_is_stable_within_a_session() {
        let mut seeds = store(MemoryBackend::default(), 1);
        let first = seeds.get_or_create(SeedKey::Background);
        let second = seeds.get_or_create(SeedKey::Background);
        assert_eq!(first, second);
        assert!(first < SEED_RANGE);
    }

    #[test]
    fn reseed_replaces_only_the_requested_key() {
        let mut seeds = store(MemoryBackend::default(), 2);
        let logo = seeds.get_or_create(SeedKey::Logo);
        let background = seeds.get_or_create(SeedKey::Background);

        let mut reseeded = seeds.reseed(SeedKey::Background);
        while reseeded == background {
            reseeded = seeds.reseed(SeedKey::Background);
        }
        assert_eq!(seeds.get_or_create(SeedKey::Background), reseeded);
        assert_eq!(seeds.get_or_create(SeedKey::Logo), logo);
    }

    #[test]
    fn persisted_seeds_survive_a_new_store() {
        let backend = SharedBackend::default();
        let mut first = store(backend.clone(), 3);
        let pair = first.pair();
        assert_eq!(
            backend.get("background_seed"),
            Some(pair.background.to_string())
        );

        let mut second = store(backend, 99);
        assert_eq!(second.pair(), pair);
    }

    #[test]
    fn reseed_is_visible_to_later_stores() {
        let backend = SharedBackend::default();
        let mut first = store(backend.clone(), 4);
        first.get_or_create(SeedKey::Logo);
        let reseeded = first.reseed(SeedKey::Logo);

        let mut second = store(backend, 5);
        assert_eq!(second.get_or_create(SeedKey::Logo), reseeded);
    }

    #[test]
    fn unparseable_values_are_regenerated() {
        let mut backend = SharedBackend::default();
        backend.set("logo_seed", "not-a-number").unwrap();
        backend.set("background_seed", "5000000").unwrap();
        let mut seeds = store(backend.clone(), 6);
        let logo = seeds.get_or_create(SeedKey::Logo);
        let background = seeds.get_or_create(SeedKey::Background);
        assert_eq!(backend.get("logo_seed"), Some(logo.to_string()));
        assert_eq!(backend.get("background_seed"), Some(background.to_string()));
    }

    #[test]
    fn broken_storage_degrades_to_per_load_seeds() {
        let mut seeds = store(BrokenBackend, 7);
        let first = seeds.get_or_create(SeedKey::Background);
        assert_eq!(seeds.get_or_create(SeedKey::Background), first);
        let reseeded = seeds.reseed(SeedKey::Background);
        assert_eq!(seeds.get_or_create(SeedKey::Background), reseeded);
    }
}
