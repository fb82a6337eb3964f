//! Shared UI icons.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "[STOP]");

// Run lifecycle
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "[>]");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "[RUN]");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "[T]");
