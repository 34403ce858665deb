use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub fn create_count_progress_bar(total_items: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_items);
    match ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        Ok(style) => pb.set_style(style.progress_chars("#>-")),
        Err(_) => pb.set_draw_target(ProgressDrawTarget::hidden()),
    }
    pb
}

/// Progress bar that is drawn only when `visible` is set
pub fn create_document_progress_bar(total_documents: usize, visible: bool) -> ProgressBar {
    let pb = create_count_progress_bar(total_documents as u64);
    if !visible {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb
}
