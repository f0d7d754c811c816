//! Bill commands: bill, show, update, delete, search.
//!
//! All of them sit behind the sign-in gate.

use clap::Args;
use serde_json::json;

use billdesk::error::AppError;
use billdesk::App;
use billdesk_core::validation::parse_item_arg;
use billdesk_core::{to_record, Bill, BillField, BillPatch, BillRecord, Selection};

use super::{Credentials, Output};

#[derive(Args)]
pub struct BillArgs {
    /// Customer name
    #[arg(long)]
    name: String,

    /// Customer phone
    #[arg(long)]
    phone: String,

    /// Selection as product_id=quantity; repeat for more products
    #[arg(long = "item", required = true, num_args = 1..)]
    items: Vec<String>,

    /// Recompose under this bill number, replacing the stored bill
    #[arg(long)]
    bill_no: Option<String>,

    /// Do not write the receipt to the bills directory
    #[arg(long)]
    no_archive: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    bill_no: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    bill_no: String,

    /// New customer name
    #[arg(long)]
    name: Option<String>,

    /// New customer phone
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    bill_no: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// bill_no, customer_name or customer_phone
    #[arg(long)]
    field: BillField,

    /// Exact value to match
    #[arg(long)]
    value: String,
}

pub async fn bill(
    app: &App,
    args: BillArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    app.sign_in_verified(credentials.email(), credentials.password())
        .await?;

    let mut selection = Selection::new();
    for arg in &args.items {
        let (product_id, quantity) = parse_item_arg(arg).map_err(AppError::from)?;
        selection.push(product_id, quantity);
    }

    let composition = match &args.bill_no {
        Some(bill_no) => {
            app.checkout
                .recompose(bill_no, &selection, &args.name, &args.phone)
                .await?
        }
        None => {
            app.checkout
                .checkout(&selection, &args.name, &args.phone)
                .await?
        }
    };
    let bill = &composition.bill;

    let archived = if args.no_archive {
        None
    } else {
        Some(app.archive_receipt(bill).await?)
    };

    let body = json!({
        "bill": to_record(bill),
        "dropped": composition.dropped,
        "receipt": archived,
    });
    let receipt = app.render_receipt(bill).await?;
    out.emit(&body, || {
        for product_id in &composition.dropped {
            eprintln!("warning: {} is no longer in the catalog and was skipped", product_id);
        }
        print!("{}", receipt);
        if let Some(path) = &archived {
            println!();
            println!("Receipt saved to {}", path.display());
        }
    })
}

pub async fn show(
    app: &App,
    args: ShowArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    app.sign_in_verified(credentials.email(), credentials.password())
        .await?;

    let bill = app
        .ledger
        .get(&args.bill_no)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("Bill", &args.bill_no))?;

    let receipt = app.render_receipt(&bill).await?;
    out.emit(&to_record(&bill), || {
        print!("{}", receipt)
    })
}

pub async fn update(
    app: &App,
    args: UpdateArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    app.sign_in_verified(credentials.email(), credentials.password())
        .await?;

    let patch = BillPatch {
        customer_name: args.name,
        customer_phone: args.phone,
    };
    if !app.ledger.update(&args.bill_no, &patch).await? {
        return Err(AppError::not_found("Bill", &args.bill_no).into());
    }

    out.emit(&json!({ "bill_no": args.bill_no, "updated": true }), || {
        println!("Bill {} updated", args.bill_no)
    })
}

pub async fn delete(
    app: &App,
    args: DeleteArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    app.sign_in_verified(credentials.email(), credentials.password())
        .await?;

    app.ledger
        .delete(&args.bill_no)
        .await
        .map_err(AppError::from)?;

    out.emit(&json!({ "bill_no": args.bill_no, "deleted": true }), || {
        println!("Bill {} deleted", args.bill_no)
    })
}

pub async fn search(
    app: &App,
    args: SearchArgs,
    credentials: &Credentials,
    out: Output,
) -> anyhow::Result<()> {
    app.sign_in_verified(credentials.email(), credentials.password())
        .await?;

    let mut bills = app
        .ledger
        .search(args.field, &args.value)
        .await
        .map_err(AppError::from)?;
    bills.sort_by_key(|b| std::cmp::Reverse(b.created_at()));

    let records: Vec<BillRecord> = bills.iter().map(to_record).collect();
    out.emit(&records, || print_summary(&bills))
}

fn print_summary(bills: &[Bill]) {
    if bills.is_empty() {
        println!("No bills found");
        return;
    }

    println!(
        "{:<8}{:<21}{:<24}{:<16}{:>10}",
        "Bill", "Date", "Customer", "Phone", "Total"
    );
    for bill in bills {
        println!(
            "{:<8}{:<21}{:<24}{:<16}{:>10}",
            bill.bill_no(),
            bill.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            bill.customer_name(),
            bill.customer_phone(),
            bill.total_amount().to_string()
        );
    }
}
