//! Shift+D/U/J/K paging while reading.

/// A key press as the host saw it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyPress {
    pub key: char,
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub repeat: bool,
    /// Focus is in an input, text area, editor or modal.
    pub editable_target: bool,
}

/// The page around the key press.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub height: f64,
    /// Height of the fixed header covering the top of the viewport.
    pub header_offset: f64,
    pub composer_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortcutOptions {
    pub half_ratio: f64,
    pub smooth: bool,
}

impl Default for ShortcutOptions {
    fn default() -> Self {
        Self {
            half_ratio: 0.5,
            smooth: true,
        }
    }
}

/// Scroll the host should perform; positive `delta` is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub delta: i64,
    pub smooth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Half,
    Full,
}

pub fn scroll_for(key: &KeyPress, viewport: &Viewport, options: &ShortcutOptions) -> Option<ScrollCommand> {
    if key.ctrl || key.meta || key.alt || !key.shift {
        return None;
    }
    if key.repeat || key.editable_target || viewport.composer_open {
        return None;
    }

    let (step, down) = match key.key.to_ascii_uppercase() {
        'D' => (Step::Half, true),
        'U' => (Step::Half, false),
        'J' => (Step::Full, true),
        'K' => (Step::Full, false),
        _ => return None,
    };

    let height = viewport.height.max(0.0);
    let offset = viewport.header_offset.max(0.0);
    let amount = match step {
        Step::Half => (height * options.half_ratio).round() - (offset / 2.0).round(),
        Step::Full => (height - offset).round(),
    };
    let amount = (amount as i64).max(1);

    Some(ScrollCommand {
        delta: if down { amount } else { -amount },
        smooth: options.smooth,
    })
}
