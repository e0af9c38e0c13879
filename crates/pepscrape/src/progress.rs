use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>5}/{len:5} ({eta})";

/// A bar of `len` steps, or a hidden one that still counts positions.
pub(crate) fn bar(len: usize, message: &'static str, visible: bool) -> ProgressBar {
    let bar = if visible {
        ProgressBar::new(len as u64)
    } else {
        ProgressBar::hidden()
    };
    bar.set_length(len as u64);
    bar.set_style(
        ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar.set_message(message);
    bar
}
