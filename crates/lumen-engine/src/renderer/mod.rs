//! Render loop driver.
//!
//! [`Renderer`] is host-agnostic: the window runtime calls it from its redraw
//! callback, tests call it from [`run_scheduled`] with a headless device.

mod config;
mod driver;
mod schedule;

pub use config::{ProgramSet, RendererConfig};
pub use driver::Renderer;
pub use schedule::run_scheduled;
