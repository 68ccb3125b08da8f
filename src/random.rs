use rand::{rngs::StdRng, Rng, SeedableRng};

/// A source of randomness for exploration and coin flips
///
/// Learners take this as an explicit dependency so that tests can drive them with
/// a fixed sequence.
pub trait RandomSource {
    /// A uniform sample from `[0, 1)`
    fn uniform(&mut self) -> f64;

    /// A uniform index into a collection of `len` elements
    ///
    /// `len` is always greater than zero.
    fn choose_index(&mut self, len: usize) -> usize;

    /// A uniformly chosen element of `items`, or `None` if it is empty
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        items.get(self.choose_index(items.len()))
    }
}

/// Adapts any [`rand::Rng`] into a [`RandomSource`]
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// A reproducible source for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl Default for RngSource<StdRng> {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    fn choose_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

impl<S: RandomSource + ?Sized> RandomSource for &mut S {
    fn uniform(&mut self) -> f64 {
        (**self).uniform()
    }

    fn choose_index(&mut self, len: usize) -> usize {
        (**self).choose_index(len)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays fixed sequences of uniform samples and indices, cycling when exhausted
    #[derive(Debug, Clone)]
    pub(crate) struct ScriptedRandom {
        uniforms: VecDeque<f64>,
        indices: VecDeque<usize>,
    }

    impl ScriptedRandom {
        pub(crate) fn new(uniforms: &[f64], indices: &[usize]) -> Self {
            assert!(!uniforms.is_empty() && !indices.is_empty());
            Self {
                uniforms: uniforms.iter().copied().collect(),
                indices: indices.iter().copied().collect(),
            }
        }

        /// Never explores, always picks index 0 when asked for a random choice
        pub(crate) fn greedy() -> Self {
            Self::new(&[0.99], &[0])
        }
    }

    impl RandomSource for ScriptedRandom {
        fn uniform(&mut self) -> f64 {
            let x = self.uniforms.pop_front().unwrap_or(0.0);
            self.uniforms.push_back(x);
            x
        }

        fn choose_index(&mut self, len: usize) -> usize {
            let i = self.indices.pop_front().unwrap_or(0);
            self.indices.push_back(i);
            i % len
        }
    }

    #[test]
    fn seeded_sources_agree() {
        let mut a = RngSource::seeded(7);
        let mut b = RngSource::seeded(7);
        for _ in 0..16 {
            assert_eq!(a.uniform(), b.uniform());
            assert_eq!(a.choose_index(5), b.choose_index(5));
        }
    }

    #[test]
    fn samples_in_range() {
        let mut rng = RngSource::seeded(3);
        for _ in 0..1000 {
            let x = rng.uniform();
            assert!((0.0..1.0).contains(&x));
            assert!(rng.choose_index(3) < 3);
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = RngSource::seeded(0);
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        assert_eq!(rng.choose(&[42]), Some(&42));
    }

    #[test]
    fn scripted_cycles() {
        let mut rng = ScriptedRandom::new(&[0.1, 0.9], &[1, 4]);
        assert_eq!(rng.uniform(), 0.1);
        assert_eq!(rng.uniform(), 0.9);
        assert_eq!(rng.uniform(), 0.1);
        assert_eq!(rng.choose_index(3), 1);
        assert_eq!(rng.choose_index(3), 1);
    }
}
