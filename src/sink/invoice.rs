use std::{
    fs,
    path::{Path, PathBuf},
};

use comfy_table::{Table, presets};

use crate::{billing::invoice::Invoice, error::SiteError, prelude::*, sink::InvoiceSink};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Writes one-page plain-text invoices.
pub struct TextInvoiceWriter {
    output_dir: PathBuf,
}

impl TextInvoiceWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, pod: &str) -> PathBuf {
        self.output_dir.join(format!("invoice_{pod}.txt"))
    }

    fn write_to(path: &Path, invoice: &Invoice) -> Result {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("Facture\n\n{}\n", build_invoice_table(invoice)))?;
        Ok(())
    }
}

impl InvoiceSink for TextInvoiceWriter {
    #[instrument(skip_all, fields(pod = %invoice.pod, number = %invoice.number))]
    fn write_invoice(&self, invoice: &Invoice) -> Result<PathBuf, SiteError> {
        let path = self.path_for(&invoice.pod);
        Self::write_to(&path, invoice)
            .map_err(|error| SiteError::output_write_failure(&path, error))?;
        info!(path = %path.display(), total = %invoice.totals.total, "written");
        Ok(path)
    }
}

fn build_invoice_table(invoice: &Invoice) -> Table {
    let issuer = &invoice.issuer;
    let totals = &invoice.totals;

    let mut table = Table::new();
    table.load_preset(presets::ASCII_FULL_CONDENSED);
    table.set_header(vec!["Date:".to_owned(), invoice.issue_date.format(DATE_FORMAT).to_string()]);
    table.add_row(vec!["Numéro de la facture:".to_owned(), invoice.number.clone()]);
    table.add_row(vec!["Référence:".to_owned(), invoice.pod.clone()]);
    table.add_row(vec![
        "Période de facturation:".to_owned(),
        format!("{} - {}", totals.since.format(DATE_FORMAT), totals.until.format(DATE_FORMAT)),
    ]);
    table.add_row(vec!["Numéro de TVA:".to_owned(), issuer.vat_number.clone()]);
    table.add_row(vec![
        "Adresse:".to_owned(),
        std::iter::once(issuer.name.as_str())
            .chain(issuer.address.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
    ]);
    if let Some(contact) = &issuer.contact {
        table.add_row(vec!["Contact:".to_owned(), contact.clone()]);
    }
    table.add_row(vec!["Destinataire:".to_owned(), invoice.recipient.join("\n")]);
    table.add_row(vec!["Total hors TVA:".to_owned(), totals.pre_vat.to_string()]);
    table.add_row(vec!["Taux de TVA:".to_owned(), issuer.vat_display.clone()]);
    table.add_row(vec!["Montant total de TVA:".to_owned(), totals.vat.to_string()]);
    table.add_row(vec!["Somme totale à payer:".to_owned(), totals.total.to_string()]);
    table.add_row(vec!["Compte bancaire:".to_owned(), issuer.bank_account.clone()]);
    table.add_row(vec![
        "Échéance:".to_owned(),
        invoice.payment_deadline.format(DATE_FORMAT).to_string(),
    ]);
    table
}
