//! Descriptive dataset statistics

use crate::data::{columns, LaunchRecord, LaunchTable};
use crate::error::Result;
use crate::preprocessing::extract_labels;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Landing outcomes for one group of launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub launches: usize,
    pub successes: usize,
}

impl GroupStats {
    pub fn success_rate(&self) -> f64 {
        if self.launches == 0 {
            0.0
        } else {
            self.successes as f64 / self.launches as f64
        }
    }
}

/// Success rates with and without a boolean equipment flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    /// `None` when no launch falls on that side
    pub with_rate: Option<f64>,
    pub without_rate: Option<f64>,
}

/// Payload mass statistics over launches with a known, positive mass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total: usize,
    pub successes: usize,
    pub landing_attempts: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub payload: Option<PayloadStats>,
    /// Sorted by site name
    pub by_site: Vec<GroupStats>,
    /// Sorted by launch count descending, then orbit name
    pub by_orbit: Vec<GroupStats>,
    /// Sorted by year
    pub by_year: Vec<GroupStats>,
    pub feature_impact: Vec<FeatureImpact>,
}

impl DatasetSummary {
    /// Summarize a table, taking labels from `Class` when that column exists
    pub fn from_table(table: &LaunchTable) -> Result<Self> {
        let records = table.records()?;
        let labels: Vec<bool> = if table.has_column(columns::CLASS) {
            extract_labels(table)?.iter().map(|v| *v == 1.0).collect()
        } else {
            records.iter().map(LaunchRecord::class).collect()
        };
        Ok(Self::from_labeled(&records, &labels))
    }

    pub fn from_records(records: &[LaunchRecord]) -> Self {
        let labels: Vec<bool> = records.iter().map(LaunchRecord::class).collect();
        Self::from_labeled(records, &labels)
    }

    fn from_labeled(records: &[LaunchRecord], labels: &[bool]) -> Self {
        let group = |key_of: &dyn Fn(&LaunchRecord) -> String| -> Vec<GroupStats> {
            let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
            for (r, &ok) in records.iter().zip(labels) {
                let entry = groups.entry(key_of(r)).or_default();
                entry.0 += 1;
                entry.1 += ok as usize;
            }
            groups
                .into_iter()
                .map(|(key, (launches, successes))| GroupStats { key, launches, successes })
                .collect()
        };

        let by_site = group(&|r| r.launch_site.to_string());
        let mut by_orbit = group(&|r| r.orbit.to_string());
        by_orbit.sort_by(|a, b| b.launches.cmp(&a.launches).then_with(|| a.key.cmp(&b.key)));
        let by_year = group(&|r| r.date.year().to_string());

        let masses: Vec<f64> = records.iter().filter_map(|r| r.payload_mass).filter(|m| *m > 0.0).collect();
        let payload = (!masses.is_empty()).then(|| PayloadStats {
            mean: masses.iter().sum::<f64>() / masses.len() as f64,
            min: masses.iter().copied().fold(f64::INFINITY, f64::min),
            max: masses.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        });

        let flags: [(&str, fn(&LaunchRecord) -> bool); 3] = [
            (columns::GRID_FINS, |r| r.grid_fins),
            (columns::REUSED, |r| r.reused),
            (columns::LEGS, |r| r.legs),
        ];
        let feature_impact = flags
            .iter()
            .map(|(name, flag)| {
                let rate = |side: bool| {
                    let outcomes: Vec<bool> = records
                        .iter()
                        .zip(labels)
                        .filter(|(r, _)| flag(r) == side)
                        .map(|(_, &ok)| ok)
                        .collect();
                    (!outcomes.is_empty())
                        .then(|| outcomes.iter().filter(|ok| **ok).count() as f64 / outcomes.len() as f64)
                };
                FeatureImpact {
                    feature: name.to_string(),
                    with_rate: rate(true),
                    without_rate: rate(false),
                }
            })
            .collect();

        Self {
            total: records.len(),
            successes: labels.iter().filter(|ok| **ok).count(),
            landing_attempts: records.iter().filter(|r| r.landing_attempt).count(),
            first_date: records.iter().map(|r| r.date).min(),
            last_date: records.iter().map(|r| r.date).max(),
            payload,
            by_site,
            by_orbit,
            by_year,
            feature_impact,
        }
    }

    pub fn failures(&self) -> usize {
        self.total - self.successes
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successes as f64 / self.total as f64
        }
    }

    /// Plain-text report
    pub fn render(&self) -> String {
        let rule = "=".repeat(70);
        let thin = "-".repeat(70);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "FALCON 9 LAUNCH DATA SUMMARY");
        let _ = writeln!(out, "{}\n", rule);

        let _ = writeln!(out, "1. OVERALL STATISTICS\n{}", thin);
        let _ = writeln!(out, "   Total launches:       {}", self.total);
        let _ = writeln!(out, "   Landing attempts:     {}", self.landing_attempts);
        let _ = writeln!(out, "   Successful landings:  {}", self.successes);
        let _ = writeln!(out, "   Failed landings:      {}", self.failures());
        let _ = writeln!(out, "   Success rate:         {:.2}%", self.success_rate() * 100.0);
        if let (Some(first), Some(last)) = (self.first_date, self.last_date) {
            let _ = writeln!(out, "   Date range:           {} to {}", first, last);
        }
        if let Some(p) = &self.payload {
            let _ = writeln!(
                out,
                "   Payload mass (kg):    avg {:.2}, min {:.2}, max {:.2}",
                p.mean, p.min, p.max
            );
        }
        out.push('\n');

        write_groups(&mut out, "2. SUCCESS RATE BY LAUNCH SITE", &self.by_site);
        write_groups(&mut out, "3. SUCCESS RATE BY ORBIT (top 5 by launch count)", &self.by_orbit[..self.by_orbit.len().min(5)]);
        write_groups(&mut out, "4. SUCCESS RATE BY YEAR", &self.by_year);

        let _ = writeln!(out, "5. FEATURE IMPACT\n{}", thin);
        for impact in &self.feature_impact {
            let fmt_rate = |r: Option<f64>| r.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0));
            let _ = writeln!(
                out,
                "   {:<10} with: {:>8}   without: {:>8}",
                impact.feature,
                fmt_rate(impact.with_rate),
                fmt_rate(impact.without_rate)
            );
        }
        let _ = writeln!(out, "\n{}", rule);
        out
    }
}

fn write_groups(out: &mut String, title: &str, groups: &[GroupStats]) {
    let _ = writeln!(out, "{}\n{}", title, "-".repeat(70));
    for g in groups {
        let _ = writeln!(
            out,
            "   {:<16} launches: {:>4}   success rate: {:>7.2}%",
            g.key,
            g.launches,
            g.success_rate() * 100.0
        );
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GeneratorConfig, SampleGenerator};

    #[test]
    fn test_summary_counts() {
        let records = SampleGenerator::new(GeneratorConfig::default().with_samples(60)).generate().unwrap();
        let summary = DatasetSummary::from_records(&records);

        assert_eq!(summary.total, 60);
        assert_eq!(summary.successes + summary.failures(), 60);
        assert!(summary.successes <= summary.landing_attempts);
        assert_eq!(summary.by_site.iter().map(|g| g.launches).sum::<usize>(), 60);
        assert_eq!(summary.by_year.iter().map(|g| g.successes).sum::<usize>(), summary.successes);
        assert!(summary.first_date <= summary.last_date);
        assert!(summary.by_orbit.windows(2).all(|w| w[0].launches >= w[1].launches));
    }

    #[test]
    fn test_render_sections() {
        let records = SampleGenerator::new(GeneratorConfig::default().with_samples(20)).generate().unwrap();
        let text = DatasetSummary::from_records(&records).render();
        assert!(text.contains("Total launches:       20"));
        assert!(text.contains("SUCCESS RATE BY LAUNCH SITE"));
        assert!(text.contains("GridFins"));
    }

    #[test]
    fn test_summary_uses_class_column() {
        let records = SampleGenerator::new(GeneratorConfig::default().with_samples(30)).generate().unwrap();
        let table = LaunchTable::from_records(&records).unwrap();
        let from_table = DatasetSummary::from_table(&table).unwrap();
        assert_eq!(from_table, DatasetSummary::from_records(&records));
    }

    #[test]
    fn test_empty_summary() {
        let summary = DatasetSummary::from_records(&[]);
        assert_eq!(summary.success_rate(), 0.0);
        assert!(summary.payload.is_none());
        assert!(summary.render().contains("Total launches:       0"));
    }
}
