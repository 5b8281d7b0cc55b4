//! Shared UI icons.

use console::Emoji;

// Decisions
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[NO]");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP]");

// Review
pub static GAVEL: Emoji<'_, '_> = Emoji("🔨 ", "[R]");
pub static PENCIL: Emoji<'_, '_> = Emoji("📝 ", "~");
pub static LOCK: Emoji<'_, '_> = Emoji("🔒 ", "-");
