//! Edge-triggered buttons
//!
//! Each monitored button owns a two-state latch (Released <-> Pressed). A
//! press event fires only on the Released -> Pressed transition, so holding a
//! button does not repeat its action every frame.

use serde::{Deserialize, Serialize};

/// Buttons monitored by the match screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Dash,
    Catch,
    Exit,
    Confirm,
    Cancel,
}

impl Button {
    pub const ALL: [Button; 5] = [
        Button::Dash,
        Button::Catch,
        Button::Exit,
        Button::Confirm,
        Button::Cancel,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// One-shot press of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEvent(pub Button);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Latch {
    #[default]
    Released,
    Pressed,
}

impl Latch {
    /// Feed the current pressed state, returning the new latch and whether it fired
    pub fn step(self, pressed: bool) -> (Latch, bool) {
        match (self, pressed) {
            (Latch::Released, true) => (Latch::Pressed, true),
            (Latch::Pressed, true) => (Latch::Pressed, false),
            (_, false) => (Latch::Released, false),
        }
    }
}

/// Raw "currently held" state of every button for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    held: [bool; Button::ALL.len()],
}

impl ButtonStates {
    pub fn with(mut self, button: Button) -> Self {
        self.set(button, true);
        self
    }

    pub fn set(&mut self, button: Button, held: bool) {
        self.held[button.index()] = held;
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held[button.index()]
    }
}

/// Buttons that fired this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presses {
    fired: [bool; Button::ALL.len()],
}

impl Presses {
    pub fn contains(&self, button: Button) -> bool {
        self.fired[button.index()]
    }

    pub fn is_empty(&self) -> bool {
        !self.fired.iter().any(|&f| f)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDetector {
    latches: [Latch; Button::ALL.len()],
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_frame(&mut self, button: Button, pressed: bool) -> Option<PressEvent> {
        let latch = &mut self.latches[button.index()];
        let (next, fired) = latch.step(pressed);
        *latch = next;
        fired.then_some(PressEvent(button))
    }

    /// Feed every monitored button, whether or not its widget is visible
    pub fn update(&mut self, states: &ButtonStates) -> Presses {
        let mut presses = Presses::default();
        for button in Button::ALL {
            if let Some(PressEvent(b)) = self.on_frame(button, states.is_held(button)) {
                presses.fired[b.index()] = true;
            }
        }
        presses
    }

    pub fn latch(&self, button: Button) -> Latch {
        self.latches[button.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fires_once_on_press() {
        let mut edges = EdgeDetector::new();
        assert_eq!(edges.on_frame(Button::Dash, true), Some(PressEvent(Button::Dash)));
        assert_eq!(edges.on_frame(Button::Dash, true), None);
        assert_eq!(edges.on_frame(Button::Dash, false), None);
        assert_eq!(edges.on_frame(Button::Dash, true), Some(PressEvent(Button::Dash)));
    }

    #[test]
    fn test_buttons_are_independent() {
        let mut edges = EdgeDetector::new();
        let both = ButtonStates::default().with(Button::Exit).with(Button::Cancel);
        let presses = edges.update(&both);
        assert!(presses.contains(Button::Exit));
        assert!(presses.contains(Button::Cancel));
        assert!(!presses.contains(Button::Dash));

        let presses = edges.update(&ButtonStates::default().with(Button::Exit));
        assert!(presses.is_empty());
        assert_eq!(edges.latch(Button::Cancel), Latch::Released);
    }

    #[test]
    fn test_release_while_hidden_clears_latch() {
        // The confirm button is hidden, but still sampled every frame
        let mut edges = EdgeDetector::new();
        edges.update(&ButtonStates::default().with(Button::Confirm));
        edges.update(&ButtonStates::default());
        assert_eq!(edges.latch(Button::Confirm), Latch::Released);
        let presses = edges.update(&ButtonStates::default().with(Button::Confirm));
        assert!(presses.contains(Button::Confirm));
    }

    proptest! {
        #[test]
        fn prop_one_event_per_hold(frames in prop::collection::vec(any::<bool>(), 1..200)) {
            let mut edges = EdgeDetector::new();
            let mut previous = false;
            let mut expected = 0;
            let mut fired = 0;
            for pressed in frames {
                if pressed && !previous {
                    expected += 1;
                }
                if edges.on_frame(Button::Catch, pressed).is_some() {
                    fired += 1;
                }
                previous = pressed;
            }
            prop_assert_eq!(fired, expected);
        }

        #[test]
        fn prop_long_hold_fires_only_first_frame(n in 1usize..300) {
            let mut edges = EdgeDetector::new();
            let events: Vec<_> = (0..n).map(|_| edges.on_frame(Button::Dash, true)).collect();
            prop_assert!(events[0].is_some());
            prop_assert!(events[1..].iter().all(Option::is_none));
        }
    }
}
