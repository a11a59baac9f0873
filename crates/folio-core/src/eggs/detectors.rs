//! Key and click sequence detectors.

use std::collections::VecDeque;

/// Key codes of the konami code, in order.
pub const KONAMI_CODE: [&str; 10] = [
    "ArrowUp",
    "ArrowUp",
    "ArrowDown",
    "ArrowDown",
    "ArrowLeft",
    "ArrowRight",
    "ArrowLeft",
    "ArrowRight",
    "KeyB",
    "KeyA",
];

/// Words that reveal the secret commands panel when typed anywhere.
pub const SECRET_WORDS: [&str; 4] = ["debug", "selenium", "cypress", "playwright"];

/// Typed buffer is cut back once it grows past this many characters...
const TYPED_BUFFER_MAX: usize = 20;
/// ...keeping this many of the most recent ones.
const TYPED_BUFFER_KEEP: usize = 10;

/// Logo clicks needed to reveal the click egg.
pub const CLICK_THRESHOLD: u32 = 10;

/// Rolling window over the last ten key codes.
#[derive(Debug, Default)]
pub struct KonamiDetector {
    window: VecDeque<String>,
}

impl KonamiDetector {
    /// Feed one key code. Returns true when the window matches the code,
    /// after which the window starts over.
    pub fn push(&mut self, code: &str) -> bool {
        self.window.push_back(code.to_string());
        if self.window.len() > KONAMI_CODE.len() {
            self.window.pop_front();
        }
        if self.window.iter().eq(KONAMI_CODE.iter()) {
            self.window.clear();
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
pub struct TypedSecretDetector {
    typed: String,
}

impl TypedSecretDetector {
    /// Feed one key value. Only single-character keys count; names such as
    /// `Shift` or `Enter` are ignored. Returns the secret word that matched.
    pub fn push(&mut self, key: &str) -> Option<&'static str> {
        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        self.typed.extend(c.to_lowercase());

        let found = SECRET_WORDS.iter().copied().find(|w| self.typed.contains(w));
        if found.is_some() {
            self.typed.clear();
        }
        let len = self.typed.chars().count();
        if len > TYPED_BUFFER_MAX {
            self.typed = self.typed.chars().skip(len - TYPED_BUFFER_KEEP).collect();
        }
        found
    }
}

#[derive(Debug, Default)]
pub struct ClickCounter {
    count: u32,
}

impl ClickCounter {
    /// Count a click. Returns true on the threshold click and resets.
    pub fn click(&mut self) -> bool {
        self.count += 1;
        if self.count >= CLICK_THRESHOLD {
            self.count = 0;
            return true;
        }
        false
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_konami_detected() {
        let mut detector = KonamiDetector::default();
        let hits: Vec<bool> = KONAMI_CODE.iter().map(|c| detector.push(c)).collect();
        assert_eq!(hits.iter().filter(|h| **h).count(), 1);
        assert!(hits[9]);
    }

    #[test]
    fn test_konami_after_noise() {
        let mut detector = KonamiDetector::default();
        for code in ["KeyX", "ArrowUp", "Enter"] {
            assert!(!detector.push(code));
        }
        let last = KONAMI_CODE.iter().map(|c| detector.push(c)).last();
        assert_eq!(last, Some(true));
    }

    #[test]
    fn test_konami_resets_after_match() {
        let mut detector = KonamiDetector::default();
        for code in KONAMI_CODE {
            detector.push(code);
        }
        // the trailing "KeyA" must not count toward a second match
        for code in &KONAMI_CODE[..9] {
            assert!(!detector.push(code));
        }
        assert!(detector.push("KeyA"));
    }

    #[test]
    fn test_typed_secret() {
        let mut detector = TypedSecretDetector::default();
        let found: Vec<Option<&str>> = "xxDeBuG".chars().map(|c| detector.push(&c.to_string())).collect();
        assert_eq!(found.last(), Some(&Some("debug")));
        assert_eq!(found.iter().flatten().count(), 1);
    }

    #[test]
    fn test_typed_ignores_named_keys() {
        let mut detector = TypedSecretDetector::default();
        for key in ["d", "e", "Shift", "b", "u", "Enter", "g"] {
            let _ = detector.push(key);
        }
        assert!(detector.typed.is_empty(), "buffer clears on match");
    }

    #[test]
    fn test_typed_buffer_trimmed() {
        let mut detector = TypedSecretDetector::default();
        for _ in 0..21 {
            let _ = detector.push("z");
        }
        assert_eq!(detector.typed.len(), TYPED_BUFFER_KEEP);
    }

    #[test]
    fn test_click_counter() {
        let mut counter = ClickCounter::default();
        for _ in 0..9 {
            assert!(!counter.click());
        }
        assert!(counter.click());
        assert_eq!(counter.count(), 0);
    }
}
