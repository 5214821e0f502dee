use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AnalyticsReport, Course, Projection};

fn write_bucket(output: &mut String, title: &str, courses: &[Course]) {
    let _ = writeln!(output, "### {} ({})", title, courses.len());
    if courses.is_empty() {
        let _ = writeln!(output, "No courses in this group.");
        return;
    }
    for course in courses {
        let _ = writeln!(
            output,
            "- {} ({}, term {}, {} credits)",
            course.name, course.grade, course.term, course.credits
        );
    }
}

pub fn build_report(source: Option<&str>, generated: NaiveDate, report: &AnalyticsReport) -> String {
    let mut output = String::new();
    let source_label = source.unwrap_or("stored courses");

    let _ = writeln!(output, "# GPA Performance Report");
    let _ = writeln!(output, "Generated for {} on {}", source_label, generated);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Overall GPA: {:.2}", report.overall_gpa);
    let _ = writeln!(output, "- Total credits: {}", report.total_credits);
    let _ = writeln!(
        output,
        "- Consistency (term GPA std dev): {:.3}",
        report.term_gpa_std_dev
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Term Trend");

    if report.terms.is_empty() {
        let _ = writeln!(output, "No terms recorded.");
    } else {
        let _ = writeln!(output, "| Term | Credits | GPA |");
        let _ = writeln!(output, "|------|---------|-----|");
        for term in report.terms.iter() {
            let _ = writeln!(output, "| {} | {} | {:.2} |", term.term, term.credits, term.gpa);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Forecast");

    match &report.projection {
        Projection::Forecast(forecast) => {
            let _ = writeln!(
                output,
                "- Predicted GPA for term {}: {:.2}",
                forecast.next_term, forecast.gpa
            );
            let _ = writeln!(output, "- Trend: {}", forecast.trend);
            let _ = writeln!(
                output,
                "- Model: slope {:.3}, intercept {:.3}, r² {:.2}",
                forecast.fit.slope, forecast.fit.intercept, forecast.fit.r_squared
            );
        }
        Projection::InsufficientData { terms } => {
            let _ = writeln!(
                output,
                "Not enough data to forecast: {} term(s) recorded, at least 2 needed.",
                terms
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Strengths");
    write_bucket(&mut output, "Strong", &report.strengths.strong);
    write_bucket(&mut output, "Average", &report.strengths.average);
    write_bucket(&mut output, "Weak", &report.strengths.weak);

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{analyze, AnalyticsConfig};

    fn generated() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    #[test]
    fn renders_forecast_section() {
        let courses = vec![
            Course::new(1, "Operating Systems", 4, "B", 1),
            Course::new(2, "Distributed Systems", 4, "A-", 2),
        ];
        let report = analyze(&courses, &AnalyticsConfig::default()).unwrap();
        let text = build_report(Some("fall.csv"), generated(), &report);

        assert!(text.starts_with("# GPA Performance Report\n"));
        assert!(text.contains("Generated for fall.csv on 2026-09-01"));
        assert!(text.contains("- Overall GPA: 3.35"));
        assert!(text.contains("- Consistency (term GPA std dev): 0.350"));
        assert!(text.contains("| 2 | 4 | 3.70 |"));
        assert!(text.contains("- Predicted GPA for term 3: 4.00"));
        assert!(text.contains("- Trend: rising"));
        assert!(text.contains("- Distributed Systems (A-, term 2, 4 credits)"));
    }

    #[test]
    fn renders_insufficient_data_and_empty_groups() {
        let courses = vec![Course::new(1, "Seminar", 1, "C", 5)];
        let report = analyze(&courses, &AnalyticsConfig::default()).unwrap();
        let text = build_report(None, generated(), &report);

        assert!(text.contains("Generated for stored courses"));
        assert!(text.contains("Not enough data to forecast: 1 term(s) recorded"));
        assert!(text.contains("### Strong (0)\nNo courses in this group."));
        assert!(text.contains("### Weak (1)\n- Seminar (C, term 5, 1 credits)"));
    }
}
