//! Alert generation
//!
//! Classified pixels are grouped into connected regions; each region gets a
//! centroid, an advisory looked up from its label, and an alert flag from a
//! configurable [`AlertPredicate`].

mod advisory;
mod predicate;
mod regions;

pub use advisory::AdvisoryTable;
pub use predicate::{AlertLabels, AlertPredicate};
pub use regions::{regions, regions_with, AlertParams, AlertRegion, Bounds};

/// Plain-text report of the triggered regions, one line each
pub fn alert_report(regions: &[AlertRegion]) -> String {
    let triggered: Vec<&AlertRegion> = regions.iter().filter(|r| r.triggered).collect();
    if triggered.is_empty() {
        return format!("No alerts ({} regions checked)\n", regions.len());
    }

    let mut report = format!("{} alert(s) in {} regions\n", triggered.len(), regions.len());
    for region in triggered {
        report.push_str(&format!("  {}\n", region));
    }
    report
}
