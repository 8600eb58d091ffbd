//! Donation Settings Scaffold
//!
//! Presentation model for settings screens: a top app bar (title, navigation,
//! trailing actions) above a content area, with the app bar reacting to
//! scrolling.
//!
//! The scaffold holds no state of its own. The caller owns a
//! [`TopAppBarState`], forwards scroll deltas to it, and renders a frame per
//! layout pass:
//!
//! ```
//! use donations_scaffold::{Navigation, SettingsScaffold, TopAppBarState};
//!
//! let scaffold = SettingsScaffold::new("Donate").navigation(Navigation::Back);
//! let mut state = TopAppBarState::new();
//!
//! state.on_scroll(-24.0);
//! let frame = scaffold.render(&state, |padding| format!("rows below {}dp", padding.top));
//!
//! assert!(frame.top_bar.show_divider);
//! assert_eq!(frame.content, "rows below 64dp");
//! ```

mod colors;

pub use colors::{AppBarColors, Color};

use serde::Serialize;

use donations_settings::Theme;

/// Height of the pinned top app bar
pub const TOP_APP_BAR_HEIGHT_DP: f32 = 64.0;

/// Scroll state of a pinned top app bar.
///
/// Negative offsets mean content has scrolled under the bar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TopAppBarState {
    content_offset: f32,
}

impl TopAppBarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a vertical scroll delta (negative when scrolling content up)
    pub fn on_scroll(&mut self, delta_y: f32) {
        self.content_offset = (self.content_offset + delta_y).min(0.0);
    }

    pub fn content_offset(&self) -> f32 {
        self.content_offset
    }

    /// 1 when content is under the bar, 0 otherwise
    pub fn overlapped_fraction(&self) -> f32 {
        if self.content_offset < 0.0 {
            1.0
        } else {
            0.0
        }
    }
}

/// Leading navigation affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Navigation {
    Back,
    Close,
}

impl Navigation {
    /// Accessibility label
    pub fn content_description(&self) -> &'static str {
        match self {
            Navigation::Back => "Navigate up",
            Navigation::Close => "Close",
        }
    }
}

/// Trailing app bar action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppBarAction {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

impl AppBarAction {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Insets the content must leave for the app bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContentPadding {
    pub top: f32,
    pub bottom: f32,
}

/// The top app bar as rendered for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopAppBar {
    pub title: String,
    pub navigation: Option<Navigation>,
    pub navigation_description: Option<&'static str>,
    pub actions: Vec<AppBarAction>,
    pub container_color: Color,
    pub title_color: Color,
    pub overlapped_fraction: f32,
    /// Divider under the bar while content scrolls beneath it
    pub show_divider: bool,
}

/// One rendered settings page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaffoldFrame<C> {
    pub top_bar: TopAppBar,
    pub snackbar: Option<String>,
    pub padding: ContentPadding,
    pub content: C,
}

/// Standard settings page layout
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsScaffold {
    title: String,
    navigation: Option<Navigation>,
    actions: Vec<AppBarAction>,
    snackbar: Option<String>,
    colors: AppBarColors,
}

impl SettingsScaffold {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            navigation: None,
            actions: Vec::new(),
            snackbar: None,
            colors: AppBarColors::default(),
        }
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn action(mut self, action: AppBarAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Message shown in the snackbar host
    pub fn snackbar(mut self, message: impl Into<String>) -> Self {
        self.snackbar = Some(message.into());
        self
    }

    pub fn colors(mut self, colors: AppBarColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn theme(self, theme: Theme, system_dark: bool) -> Self {
        self.colors(AppBarColors::for_theme(theme, system_dark))
    }

    /// Lay out one frame; `content` receives the padding it must respect
    pub fn render<C>(
        &self,
        state: &TopAppBarState,
        content: impl FnOnce(ContentPadding) -> C,
    ) -> ScaffoldFrame<C> {
        let overlapped_fraction = state.overlapped_fraction();
        let padding = ContentPadding {
            top: TOP_APP_BAR_HEIGHT_DP,
            bottom: 0.0,
        };

        ScaffoldFrame {
            top_bar: TopAppBar {
                title: self.title.clone(),
                navigation: self.navigation,
                navigation_description: self.navigation.map(|n| n.content_description()),
                actions: self.actions.clone(),
                container_color: self.colors.container_at(overlapped_fraction),
                title_color: self.colors.title,
                overlapped_fraction,
                show_divider: overlapped_fraction > 0.0,
            },
            snackbar: self.snackbar.clone(),
            padding,
            content: content(padding),
        }
    }
}
