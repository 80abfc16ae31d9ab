use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use invoice_finance_core::contracts::CurrentUser;
use invoice_finance_core::lifecycle::{
    self, Invoice, InvoiceEvent, InvoiceEventKind, InvoiceStatus, NewInvoice,
};
use invoice_finance_core::policy::FinancingPolicy;

use crate::input;

/// Arguments for replaying lifecycle events against an invoice
#[derive(Args)]
pub struct LifecycleArgs {
    /// Path to JSON input file: { "invoice" | "new_invoice", "events", "acting_user"? }
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LifecycleInput {
    #[serde(default)]
    invoice: Option<Invoice>,
    #[serde(default)]
    new_invoice: Option<NewInvoice>,
    events: Vec<InvoiceEvent>,
    #[serde(default)]
    acting_user: Option<CurrentUser>,
}

#[derive(Debug, Serialize)]
struct Transition {
    event: InvoiceEventKind,
    from: InvoiceStatus,
    to: InvoiceStatus,
}

#[derive(Debug, Serialize)]
struct LifecycleOutput {
    invoice: Invoice,
    transitions: Vec<Transition>,
    is_terminal: bool,
}

pub fn run_lifecycle(
    args: LifecycleArgs,
    policy: &FinancingPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let lc_input: LifecycleInput = input::file_or_stdin(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for lifecycle replay")?;

    let mut invoice = match (lc_input.invoice, lc_input.new_invoice) {
        (Some(invoice), None) => invoice,
        (None, Some(new_invoice)) => Invoice::new(new_invoice, policy)?,
        _ => return Err("Provide exactly one of 'invoice' or 'new_invoice'".into()),
    };

    let mut transitions = Vec::with_capacity(lc_input.events.len());
    for event in lc_input.events {
        let kind = event.kind();
        let from = invoice.status();
        invoice = match lc_input.acting_user {
            Some(ref user) => lifecycle::apply_event_as(&invoice, event, user)?,
            None => lifecycle::apply_event(&invoice, event)?,
        };
        transitions.push(Transition {
            event: kind,
            from,
            to: invoice.status(),
        });
    }
    info!(invoice = %invoice.id(), applied = transitions.len(), status = %invoice.status(), "lifecycle replay complete");

    let output = LifecycleOutput {
        is_terminal: invoice.status().is_terminal(),
        invoice,
        transitions,
    };
    Ok(serde_json::to_value(output)?)
}
