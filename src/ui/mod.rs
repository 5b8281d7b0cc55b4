//! Presentation side of the review gate.
//!
//! The gate only notifies a [`ReviewPresenter`]; it never waits on one, so
//! headless use simply passes no presenter.

pub mod icons;
pub mod position;
pub mod terminal;

pub use crate::review::session::SessionView;
pub use position::PanelPosition;
pub use terminal::TerminalPresenter;

/// Receives show/hide notifications for the open review.
pub trait ReviewPresenter: Send + Sync {
    /// A review was opened and should be displayed.
    fn show(&self, view: SessionView<'_>);

    /// The review closed or was abandoned.
    fn hide(&self);
}
