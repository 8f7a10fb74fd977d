use std::fmt::Write;

use crate::catalog::CatalogLoadReport;
use crate::planner::{FuelStop, FuelStopPlan};

/// Presentation style for turning a [`FuelStopPlan`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRenderMode {
    PlainText,
    RichText,
}

impl FuelStop {
    fn location_label(&self) -> String {
        if self.station.city.is_empty() {
            self.station.state.clone()
        } else {
            format!("{}, {}", self.station.city, self.station.state)
        }
    }
}

impl FuelStopPlan {
    /// Render the plan using the requested textual mode.
    pub fn render(&self, mode: PlanRenderMode) -> String {
        match mode {
            PlanRenderMode::PlainText => self.render_plain(),
            PlanRenderMode::RichText => self.render_rich(),
        }
    }

    fn render_plain(&self) -> String {
        let summary = &self.summary;
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Fuel plan: {:.1} miles, {} stop{} (strategy: {}, refuel: {})",
            summary.total_distance,
            summary.stop_count,
            if summary.stop_count == 1 { "" } else { "s" },
            summary.strategy,
            summary.refuel_policy
        );

        if self.stops.is_empty() {
            let _ = writeln!(
                buffer,
                "No refueling needed: usable range {:.1} miles covers the trip.",
                summary.usable_range
            );
        }

        for (index, stop) in self.stops.iter().enumerate() {
            let _ = writeln!(
                buffer,
                "{:>3}: mile {:>7.1}  {} ({}) [{}]  ${:.3}/gal  {:.2} gal  ${:.2}",
                index + 1,
                stop.distance_from_start,
                stop.station.name,
                stop.station.id,
                stop.location_label(),
                stop.station.price,
                stop.gallons,
                stop.cost
            );
        }

        let _ = writeln!(
            buffer,
            "Total: {:.2} gal, ${:.2} ({} stations considered)",
            summary.total_gallons, summary.total_cost, summary.stations_considered
        );
        buffer
    }

    fn render_rich(&self) -> String {
        let summary = &self.summary;
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "**Fuel plan** _{:.1} miles_ ({} stops, strategy: `{}`, refuel: `{}`)",
            summary.total_distance, summary.stop_count, summary.strategy, summary.refuel_policy
        );
        for (index, stop) in self.stops.iter().enumerate() {
            let _ = writeln!(
                buffer,
                "* {:>2}. **{}** (`{}`) {} at mile {:.1}, {:.1} mi off route: {:.2} gal @ ${:.3} = **${:.2}**",
                index + 1,
                stop.station.name,
                stop.station.id,
                stop.location_label(),
                stop.distance_from_start,
                stop.offset,
                stop.gallons,
                stop.station.price,
                stop.cost
            );
        }
        let _ = writeln!(
            buffer,
            "**Total:** {:.2} gal, **${:.2}**",
            summary.total_gallons, summary.total_cost
        );
        buffer
    }
}

impl CatalogLoadReport {
    /// Render the import summary, optionally listing every rejected record.
    pub fn render(&self, show_rejected: bool) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Stations: {} processed, {} accepted, {} rejected",
            self.processed,
            self.accepted,
            self.rejected.len()
        );
        if show_rejected {
            for rejected in &self.rejected {
                let row = rejected
                    .row
                    .map_or_else(|| "-".to_string(), |row| row.to_string());
                let id = rejected
                    .station_id
                    .map_or_else(|| "?".to_string(), |id| id.to_string());
                let _ = writeln!(buffer, "  row {row:>6}  id {id:>8}  {}", rejected.reason);
            }
        }
        buffer
    }
}
