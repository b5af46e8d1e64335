use granska_core::model::{CandidateRecord, Report};
use granska_core::scoring;

pub fn print_report(report: &Report) {
    let partial = if report.partial { " (partial)" } else { "" };
    println!("=== {}{} ===\n", report.document_id, partial);

    for field in report.fields.values() {
        let marker = if field.partial { " (?)" } else { "" };
        if field.is_empty() {
            println!("  {}{}: -", field.field, marker);
            continue;
        }
        if !field.field.is_multi_valued() {
            if let Some(best) = field.best() {
                let organisation = best
                    .organisation
                    .as_deref()
                    .map(|org| format!(" ({org})"))
                    .unwrap_or_default();
                println!(
                    "  {}{}: {}{}  [{:.2}, {}]",
                    field.field, marker, best.value, organisation, best.confidence, best.provenance
                );
            }
            continue;
        }

        println!("  {}{}:", field.field, marker);
        for (i, value) in field.selected_values.iter().enumerate() {
            println!(
                "    {:>2}. {}  [{:.2}, {}]",
                i + 1,
                value.value,
                value.confidence,
                value.provenance
            );
        }
    }
}

/// Every candidate with its score breakdown; those under `floor` are flagged.
pub fn print_candidates(records: &[CandidateRecord], floor: f64) {
    if records.is_empty() {
        println!("No candidates.");
        return;
    }

    let max_value = records
        .iter()
        .map(|r| r.value.chars().count().min(60))
        .max()
        .unwrap_or(10);

    for record in records {
        let below = if record.confidence < floor { "  (below floor)" } else { "" };
        let value: String = record.value.chars().take(60).collect();
        println!(
            "{:<12} {:<width$}  {:.3}  {}  {}{}",
            record.field.key(),
            value,
            record.confidence,
            record.provenance,
            record.document_id,
            below,
            width = max_value
        );
        if let Some(keyword) = &record.keyword {
            println!("    keyword: {keyword}");
        }
        for c in scoring::explain(record.field, &record.signals) {
            if c.contribution > 0.0 {
                println!(
                    "    {:<40} {:.2} x {:.3} = {:.3}",
                    c.term, c.weight, c.value, c.contribution
                );
            }
        }
    }
}
