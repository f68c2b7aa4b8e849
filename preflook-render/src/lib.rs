pub mod screen;
pub mod shared;
pub mod skia;
pub mod terminal;

pub use ab_glyph::FontVec;
pub use screen::{Line, LineStyle, Screen};
pub use shared::{ScreenHandle, SharedScreen};
pub use skia::{SkiaRenderer, find_system_font, load_font};
pub use terminal::{TerminalInput, TerminalPresenter, map_key};
