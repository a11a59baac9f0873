//! Easter eggs.
//!
//! All interaction state lives in an `EggSession` owned by the host page,
//! which feeds it `Input`s and applies the returned `EggEvent`s.

pub mod detectors;
pub mod resize;
pub mod slider;

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub use detectors::{ClickCounter, KonamiDetector, TypedSecretDetector};
pub use resize::{Particle, ResizeGame, ResizeStep};
pub use slider::SlideShow;

/// How long a revealed egg stays visible.
pub const REVEAL_DURATION: Duration = Duration::from_secs(4);

/// Slides in the default image slider.
pub const DEFAULT_SLIDE_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EggKind {
    Click,
    Konami,
    SecretCommands,
}

impl EggKind {
    /// Id of the page element that shows this egg.
    pub fn element_id(&self) -> &'static str {
        match self {
            EggKind::Click => "click-egg",
            EggKind::Konami => "konami-egg",
            EggKind::SecretCommands => "secret-commands",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A keydown: `code` is the physical key (`KeyB`), `key` the typed value (`b`).
    Key { code: String, key: String },
    LogoClick,
    ProfileClick,
    /// Click on the slider backdrop, outside the image.
    BackdropClick,
    SlideStep(i64),
    SlideJump(usize),
    /// Click on the resume dropdown button.
    ResumeClick,
    /// Click anywhere outside the resume dropdown and its button.
    PageClick,
}

impl Input {
    pub fn key(code: &str, key: &str) -> Self {
        Input::Key {
            code: code.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EggEvent {
    Reveal(EggKind),
    GamerModeUnlocked,
    SliderOpened,
    SliderClosed,
    SlideChanged(usize),
    Resize(ResizeStep),
    ResumeMenuOpened,
    ResumeMenuClosed,
}

pub struct EggSession {
    konami: KonamiDetector,
    typed: TypedSecretDetector,
    logo_clicks: ClickCounter,
    slides: SlideShow,
    resize: ResizeGame,
    gamer_mode: bool,
    resume_open: bool,
    rng: StdRng,
}

impl Default for EggSession {
    fn default() -> Self {
        Self::new(DEFAULT_SLIDE_COUNT)
    }
}

impl EggSession {
    pub fn new(slide_count: usize) -> Self {
        Self::with_rng(slide_count, StdRng::from_entropy())
    }

    /// Session with a fixed seed, for reproducible explosions.
    pub fn seeded(slide_count: usize, seed: u64) -> Self {
        Self::with_rng(slide_count, StdRng::seed_from_u64(seed))
    }

    fn with_rng(slide_count: usize, rng: StdRng) -> Self {
        Self {
            konami: KonamiDetector::default(),
            typed: TypedSecretDetector::default(),
            logo_clicks: ClickCounter::default(),
            slides: SlideShow::new(slide_count),
            resize: ResizeGame::default(),
            gamer_mode: false,
            resume_open: false,
            rng,
        }
    }

    pub fn gamer_mode(&self) -> bool {
        self.gamer_mode
    }

    /// Whether the resume format menu is showing.
    pub fn resume_open(&self) -> bool {
        self.resume_open
    }

    pub fn slides(&self) -> &SlideShow {
        &self.slides
    }

    pub fn resize_game(&self) -> &ResizeGame {
        &self.resize
    }

    pub fn handle(&mut self, input: Input) -> Vec<EggEvent> {
        let mut events = Vec::new();
        match input {
            Input::Key { code, key } => {
                if self.konami.push(&code) {
                    self.gamer_mode = true;
                    events.push(EggEvent::Reveal(EggKind::Konami));
                    events.push(EggEvent::GamerModeUnlocked);
                }
                if self.typed.push(&key).is_some() {
                    events.push(EggEvent::Reveal(EggKind::SecretCommands));
                }
                if key == "Escape" && self.slides.close() {
                    events.push(EggEvent::SliderClosed);
                }
            }
            Input::LogoClick => {
                if self.logo_clicks.click() {
                    events.push(EggEvent::Reveal(EggKind::Click));
                }
            }
            Input::ProfileClick => {
                if self.gamer_mode {
                    events.push(EggEvent::Resize(self.resize.click(&mut self.rng)));
                } else {
                    self.slides.open();
                    events.push(EggEvent::SliderOpened);
                }
            }
            Input::BackdropClick => {
                if self.slides.close() {
                    events.push(EggEvent::SliderClosed);
                }
            }
            Input::SlideStep(direction) => {
                events.push(EggEvent::SlideChanged(self.slides.change(direction)));
            }
            Input::SlideJump(index) => {
                if let Some(index) = self.slides.jump(index) {
                    events.push(EggEvent::SlideChanged(index));
                }
            }
            Input::ResumeClick => {
                self.resume_open = !self.resume_open;
                events.push(if self.resume_open {
                    EggEvent::ResumeMenuOpened
                } else {
                    EggEvent::ResumeMenuClosed
                });
            }
            Input::PageClick => {
                if self.resume_open {
                    self.resume_open = false;
                    events.push(EggEvent::ResumeMenuClosed);
                }
            }
        }

        for event in &events {
            match event {
                EggEvent::Reveal(kind) => info!(
                    egg = kind.element_id(),
                    hide_after_secs = REVEAL_DURATION.as_secs(),
                    "Easter egg activated"
                ),
                EggEvent::GamerModeUnlocked => info!("Gamer mode unlocked, profile resize game active"),
                EggEvent::Resize(ResizeStep::Exploded(_)) => info!("Profile picture exploded, game reset"),
                EggEvent::Resize(step) => info!(step = ?step, "Profile picture resized"),
                _ => {}
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detectors::KONAMI_CODE;

    fn konami(session: &mut EggSession) -> Vec<EggEvent> {
        KONAMI_CODE
            .iter()
            .flat_map(|code| {
                let key = code.strip_prefix("Key").map(str::to_lowercase).unwrap_or_default();
                session.handle(Input::key(code, &key))
            })
            .collect()
    }

    #[test]
    fn test_profile_click_opens_slider_by_default() {
        let mut session = EggSession::seeded(3, 1);
        assert_eq!(session.handle(Input::ProfileClick), vec![EggEvent::SliderOpened]);
        assert!(session.slides().is_open());
        assert_eq!(
            session.handle(Input::key("Escape", "Escape")),
            vec![EggEvent::SliderClosed]
        );
    }

    #[test]
    fn test_konami_unlocks_resize_game() {
        let mut session = EggSession::seeded(3, 1);
        let events = konami(&mut session);
        assert_eq!(
            events,
            vec![EggEvent::Reveal(EggKind::Konami), EggEvent::GamerModeUnlocked]
        );
        assert!(session.gamer_mode());

        let events = session.handle(Input::ProfileClick);
        assert!(matches!(events.as_slice(), [EggEvent::Resize(ResizeStep::Shrunk(_))]));
        assert!(!session.slides().is_open());
    }

    #[test]
    fn test_logo_clicks() {
        let mut session = EggSession::default();
        let events: Vec<EggEvent> = (0..10).flat_map(|_| session.handle(Input::LogoClick)).collect();
        assert_eq!(events, vec![EggEvent::Reveal(EggKind::Click)]);
    }

    #[test]
    fn test_typed_secret_reveals_commands() {
        let mut session = EggSession::default();
        let events: Vec<EggEvent> = "cypress"
            .chars()
            .flat_map(|c| {
                let key = c.to_string();
                session.handle(Input::key(&format!("Key{}", key.to_uppercase()), &key))
            })
            .collect();
        assert_eq!(events, vec![EggEvent::Reveal(EggKind::SecretCommands)]);
    }

    #[test]
    fn test_backdrop_closes_only_when_open() {
        let mut session = EggSession::default();
        assert!(session.handle(Input::BackdropClick).is_empty());
        session.handle(Input::ProfileClick);
        assert_eq!(session.handle(Input::BackdropClick), vec![EggEvent::SliderClosed]);
    }

    #[test]
    fn test_slide_navigation() {
        let mut session = EggSession::new(2);
        assert_eq!(session.handle(Input::SlideStep(1)), vec![EggEvent::SlideChanged(2)]);
        assert_eq!(session.handle(Input::SlideStep(1)), vec![EggEvent::SlideChanged(1)]);
        assert!(session.handle(Input::SlideJump(5)).is_empty());
    }

    #[test]
    fn test_resume_menu_toggles_and_closes_on_outside_click() {
        let mut session = EggSession::default();
        assert!(session.handle(Input::PageClick).is_empty());

        assert_eq!(session.handle(Input::ResumeClick), vec![EggEvent::ResumeMenuOpened]);
        assert!(session.resume_open());
        assert_eq!(session.handle(Input::ResumeClick), vec![EggEvent::ResumeMenuClosed]);

        session.handle(Input::ResumeClick);
        assert_eq!(session.handle(Input::PageClick), vec![EggEvent::ResumeMenuClosed]);
        assert!(!session.resume_open());
    }

    #[test]
    fn test_element_ids() {
        assert_eq!(EggKind::Click.element_id(), "click-egg");
        assert_eq!(EggKind::Konami.element_id(), "konami-egg");
        assert_eq!(EggKind::SecretCommands.element_id(), "secret-commands");
    }
}
