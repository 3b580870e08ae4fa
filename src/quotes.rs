//! # Flavor-Text Quote Pool
//!
//! A fixed pool of short quotes for the random-quote special screen, plus
//! uniform selection through an injected random generator. The pool can be
//! replaced wholesale from the config file; the built-in list is the
//! fallback when the configured pool is empty.

use rand::Rng;

/// Built-in pool, sized for a 128x64 display with word wrap.
pub const DEFAULT_QUOTES: &[&str] = &[
    "Simplicity is the ultimate sophistication.",
    "Well begun is half done.",
    "The best time to plant a tree was twenty years ago.",
    "Slow is smooth, smooth is fast.",
    "What gets measured gets managed.",
    "Perfect is the enemy of good.",
    "Make it work, make it right, make it fast.",
    "The obstacle is the way.",
    "Everything should be as simple as possible, but not simpler.",
    "A year from now you may wish you had started today.",
];

/// Pick one quote uniformly at random.
///
/// Selection happens exactly once per trigger; the caller freezes the
/// returned text for the screen's whole display duration.
pub fn pick<R: Rng + ?Sized>(pool: &[String], rng: &mut R) -> String {
    if pool.is_empty() {
        DEFAULT_QUOTES[rng.random_range(0..DEFAULT_QUOTES.len())].to_string()
    } else {
        pool[rng.random_range(0..pool.len())].clone()
    }
}
