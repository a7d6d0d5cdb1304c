//! Status lines for CLI commands

use super::context::UiContext;
use console::style;

/// Section header
pub fn section(_ctx: &UiContext, title: &str) {
    println!("{}", style(title).bold());
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("✓").green(), message);
    } else {
        println!("  {} {}", style("[OK]").green(), message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    step_ok(ctx, &format!("{} ({})", message, style(detail).dim()));
}

pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {}", style("•").cyan(), message);
    } else {
        println!("  {} {}", style("[INFO]").cyan(), message);
    }
}

/// Warning with a hint on how to resolve it
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        println!("  {} {} - {}", style("!").yellow(), message, style(hint).dim());
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

/// Aligned `key: value` row
pub fn key_value(_ctx: &UiContext, key: &str, value: &str) {
    println!("  {:<14} {}", style(format!("{}:", key)).dim(), value);
}

pub fn remark(_ctx: &UiContext, message: &str) {
    println!("  {}", style(message).dim());
}
