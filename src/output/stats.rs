//! Run statistics
//!
//! Counters gathered by the coordinator during one crawl pass.

use std::fmt;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// Candidate pages discovered on the category index
    pub candidates: usize,

    /// Article pages fetched successfully
    pub fetched: usize,

    /// Article pages skipped after a failed fetch
    pub failed: usize,

    /// Candidates skipped because robots.txt disallows them
    pub disallowed: usize,

    /// Extra fetch attempts made after transient failures
    pub retries: usize,

    /// Records in the final collection
    pub records: usize,

    /// Primary images resolved to a final asset URL
    pub images_resolved: usize,

    /// Primary images whose file page yielded no asset URL
    pub images_unresolved: usize,

    /// Lead images found through the wiki API for articles without one
    pub lead_images: usize,

    /// Whether the run stopped early (abort signal or time budget)
    pub aborted: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStats {
    /// Candidates that were never attempted
    pub fn not_visited(&self) -> usize {
        self.candidates
            .saturating_sub(self.fetched + self.failed + self.disallowed)
    }
}

impl fmt::Display for CrawlStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crawl Statistics ===")?;
        writeln!(f)?;
        writeln!(f, "Candidates:        {}", self.candidates)?;
        writeln!(f, "Fetched:           {}", self.fetched)?;
        writeln!(f, "Failed:            {}", self.failed)?;
        writeln!(f, "Disallowed:        {}", self.disallowed)?;
        writeln!(f, "Not visited:       {}", self.not_visited())?;
        writeln!(f, "Retries:           {}", self.retries)?;
        writeln!(f, "Records:           {}", self.records)?;
        writeln!(f, "Images resolved:   {}", self.images_resolved)?;
        writeln!(f, "Images unresolved: {}", self.images_unresolved)?;
        writeln!(f, "Lead images:       {}", self.lead_images)?;
        writeln!(f, "Stopped early:     {}", if self.aborted { "yes" } else { "no" })?;
        write!(f, "Duration:          {:.1}s", self.elapsed.as_secs_f64())
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStats) {
    println!("{}", stats);
}
