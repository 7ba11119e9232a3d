use std::time::Instant;

/// One progress line per this many processed frames.
pub const REPORT_EVERY: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub frames_processed: usize,
    /// Average FPS over the window that just closed.
    pub window_fps: f64,
    /// Cumulative share of the stream, None when the source did not report
    /// a total frame count.
    pub percent_complete: Option<f64>,
}

/// Windowed throughput accounting. Counters reset when a window closes, so
/// each report describes only the frames since the previous one.
pub struct ProgressWindow {
    total_frames: usize,
    window_len: usize,
    processed: usize,
    window_frames: usize,
    window_start: Instant,
}

impl ProgressWindow {
    /// `total_frames` of 0 means the stream length is unknown.
    pub fn new(total_frames: usize) -> Self {
        Self::with_window(total_frames, REPORT_EVERY)
    }

    pub fn with_window(total_frames: usize, window_len: usize) -> Self {
        Self {
            total_frames,
            window_len: window_len.max(1),
            processed: 0,
            window_frames: 0,
            window_start: Instant::now(),
        }
    }

    pub fn frames_processed(&self) -> usize {
        self.processed
    }

    /// Record one processed frame. Returns a report exactly when a window
    /// fills, never otherwise.
    pub fn observe_frame(&mut self) -> Option<ProgressReport> {
        self.processed += 1;
        self.window_frames += 1;

        if self.window_frames < self.window_len {
            return None;
        }

        let elapsed = self.window_start.elapsed().as_secs_f64();
        let window_fps = if elapsed > 0.0 {
            self.window_frames as f64 / elapsed
        } else {
            0.0
        };
        let percent_complete = (self.total_frames > 0)
            .then(|| (self.processed as f64 / self.total_frames as f64 * 100.0).min(100.0));

        self.window_frames = 0;
        self.window_start = Instant::now();

        Some(ProgressReport {
            frames_processed: self.processed,
            window_fps,
            percent_complete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_exactly_once_per_window() {
        let mut progress = ProgressWindow::new(30);
        let mut report_frames = Vec::new();
        for _ in 0..30 {
            if let Some(report) = progress.observe_frame() {
                report_frames.push(report.frames_processed);
            }
        }
        assert_eq!(report_frames, vec![10, 20, 30]);
    }

    #[test]
    fn no_report_before_window_fills() {
        let mut progress = ProgressWindow::new(100);
        for _ in 0..9 {
            assert!(progress.observe_frame().is_none());
        }
        assert!(progress.observe_frame().is_some());
    }

    #[test]
    fn percent_tracks_cumulative_share() {
        let mut progress = ProgressWindow::new(20);
        let mut reports = Vec::new();
        for _ in 0..20 {
            if let Some(report) = progress.observe_frame() {
                reports.push(report);
            }
        }
        assert_eq!(reports.len(), 2);
        assert!((reports[0].percent_complete.unwrap() - 50.0).abs() < 1e-9);
        assert!((reports[1].percent_complete.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_total_gives_no_percent() {
        let mut progress = ProgressWindow::new(0);
        for _ in 0..9 {
            progress.observe_frame();
        }
        let report = progress.observe_frame().unwrap();
        assert_eq!(report.percent_complete, None);
    }

    #[test]
    fn percent_saturates_when_stream_overruns_metadata() {
        // Container metadata can undercount; percent must not exceed 100.
        let mut progress = ProgressWindow::with_window(5, 10);
        let mut last = None;
        for _ in 0..10 {
            if let Some(report) = progress.observe_frame() {
                last = Some(report);
            }
        }
        assert_eq!(last.unwrap().percent_complete, Some(100.0));
    }
}
