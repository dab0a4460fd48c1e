//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the main interaction loop that turns key presses and
//!   stream increments into [`crate::core::app::AppAction`]s.
//! - [`renderer`]: frame composition (transcript, tag sidebar, input box and
//!   the helpline dialog).
//! - [`view`]: presentation-only state such as focus and scrolling.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns domain logic and backend coordination.

pub mod chat_loop;
pub mod renderer;
pub mod view;
