use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the projection outputs
    let mut types = Vec::new();

    // Users
    types.push(clean_type(Role::export_to_string()?));
    types.push(clean_type(UserRef::export_to_string()?));

    // Loans
    types.push(clean_type(LoanStatus::export_to_string()?));
    types.push(clean_type(InstallmentStatus::export_to_string()?));
    types.push(clean_type(MoneyValue::export_to_string()?));
    types.push(clean_type(Installment::export_to_string()?));
    types.push(clean_type(Loan::export_to_string()?));
    types.push(clean_type(CreateLoanRequest::export_to_string()?));
    types.push(clean_type(LoanUpdate::export_to_string()?));

    // Contribution payments
    types.push(clean_type(ContributionPayment::export_to_string()?));
    types.push(clean_type(CreatePaymentRequest::export_to_string()?));

    // Derived ledger views
    types.push(clean_type(EmiRow::export_to_string()?));
    types.push(clean_type(EmiSummary::export_to_string()?));
    types.push(clean_type(LoanLedger::export_to_string()?));
    types.push(clean_type(ContributionSummary::export_to_string()?));

    // Dashboard
    types.push(clean_type(MonthlyPaymentSummary::export_to_string()?));
    types.push(clean_type(LoanStatusSummary::export_to_string()?));
    types.push(clean_type(MonthSeries::export_to_string()?));
    types.push(clean_type(StatusBuckets::export_to_string()?));
    types.push(clean_type(DashboardCounts::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// Strips the per-file header and sibling imports; every type lands in one module
fn clean_type(type_def: String) -> String {
    let body = type_def
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n", body.trim())
}
